use waypost::http::parser::{parse_http_request, read_request_head, validate_request, ParseError};
use waypost::http::request::Method;
use waypost::http::response::StatusCode;

async fn parse(raw: &[u8]) -> Result<Option<waypost::http::request::Request>, ParseError> {
    let mut reader = raw;
    parse_http_request(&mut reader).await
}

#[tokio::test]
async fn test_parse_simple_get_request() {
    let parsed = parse(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.target, "/index.html");
    assert_eq!(parsed.header("Host"), Some("example.com"));
}

#[tokio::test]
async fn test_parse_request_without_headers() {
    let parsed = parse(b"HEAD /a/b-c.txt HTTP/1.1\r\n\r\n").await.unwrap().unwrap();

    assert_eq!(parsed.method, Method::HEAD);
    assert_eq!(parsed.target, "/a/b-c.txt");
    assert!(parsed.headers.is_empty());
}

#[tokio::test]
async fn test_parse_multiple_headers_in_order() {
    let parsed = parse(b"GET / HTTP/1.1\r\nHost: x\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    let names: Vec<&str> = parsed.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["Host", "User-Agent", "Accept"]);
    assert_eq!(parsed.header("Accept"), Some("*/*"));
}

#[tokio::test]
async fn test_unknown_method_is_lexically_accepted() {
    let parsed = parse(b"POST /api HTTP/1.1\r\n\r\n").await.unwrap().unwrap();
    assert_eq!(parsed.method, Method::Other("POST".to_string()));
}

#[tokio::test]
async fn test_target_without_slash_passes_grammar() {
    let parsed = parse(b"GET index.html HTTP/1.1\r\n\r\n").await.unwrap().unwrap();
    assert_eq!(parsed.target, "index.html");
}

#[tokio::test]
async fn test_eof_before_request_is_not_an_error() {
    assert!(parse(b"").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_blank_line_is_bad_request() {
    let result = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidRequest)));
}

#[tokio::test]
async fn test_malformed_header() {
    let result = parse(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidHeader)));
}

#[tokio::test]
async fn test_header_name_with_digits_is_malformed() {
    let result = parse(b"GET / HTTP/1.1\r\nX-Header2: v\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidHeader)));
}

#[tokio::test]
async fn test_header_with_bare_lf_is_malformed() {
    let result = parse(b"GET / HTTP/1.1\r\nHost: a\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidHeader)));
}

#[tokio::test]
async fn test_non_zero_content_length_is_rejected() {
    let result = parse(b"GET / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").await;
    assert!(matches!(result, Err(ParseError::BodyNotAllowed)));
}

#[tokio::test]
async fn test_zero_content_length_is_allowed() {
    let parsed = parse(b"GET / HTTP/1.1\r\ncontent-length: 0\r\n\r\n").await.unwrap();
    assert!(parsed.is_some());
}

#[tokio::test]
async fn test_duplicated_content_length() {
    let result = parse(b"GET / HTTP/1.1\r\nContent-Length: 0\r\nCONTENT-LENGTH: 0\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::DuplicatedHeader("content-length"))));
}

#[tokio::test]
async fn test_duplicated_server_and_content_type() {
    let result = parse(b"GET / HTTP/1.1\r\nServer: a\r\nServer: b\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::DuplicatedHeader("server"))));

    let result = parse(b"GET / HTTP/1.1\r\nContent-Type: a\r\ncontent-type: b\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::DuplicatedHeader("content-type"))));
}

#[tokio::test]
async fn test_other_headers_may_repeat() {
    let parsed = parse(b"GET / HTTP/1.1\r\nAccept: a\r\nAccept: b\r\n\r\n").await.unwrap().unwrap();
    assert_eq!(parsed.headers.len(), 2);
}

#[tokio::test]
async fn test_header_error_stops_reading() {
    let mut reader: &[u8] = b"GET / HTTP/1.1\r\nBad Header\r\nHost: x\r\n\r\n";
    let result = read_request_head(&mut reader).await;

    assert!(matches!(result, Err(ParseError::InvalidHeader)));
    assert_eq!(reader, b"Host: x\r\n\r\n");
}

#[tokio::test]
async fn test_bad_target_characters_are_bad_resource() {
    let result = parse(b"GET /search?q=rust HTTP/1.1\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::BadResource)));
}

#[tokio::test]
async fn test_wrong_version_is_bad_request() {
    let result = parse(b"GET / HTTP/1.0\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidRequest)));
}

#[tokio::test]
async fn test_extra_spaces_are_bad_request() {
    let result = parse(b"GET  / HTTP/1.1\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidRequest)));

    let result = parse(b"GET / HTTP/1.1 \r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidRequest)));
}

#[tokio::test]
async fn test_lone_blank_line_is_bad_request() {
    let result = parse(b"\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidRequest)));
}

#[tokio::test]
async fn test_too_long_line() {
    let mut raw = b"GET /".to_vec();
    raw.extend(std::iter::repeat_n(b'a', 8300));
    raw.extend_from_slice(b" HTTP/1.1\r\n\r\n");

    let result = parse(&raw).await;
    assert!(matches!(result, Err(ParseError::LineTooLong)));
}

#[tokio::test]
async fn test_head_can_be_validated_separately() {
    let mut reader: &[u8] = b"GET /x HTTP/1.1\r\nConnection: close\r\n\r\n";
    let head = read_request_head(&mut reader).await.unwrap().unwrap();

    assert!(head.complete);
    assert!(head.requests_close());

    let request = validate_request(head).unwrap();
    assert_eq!(request.target, "/x");
}

#[test]
fn test_rejection_statuses() {
    assert_eq!(
        ParseError::LineTooLong.status(),
        Some((StatusCode::NotFound, "Too big line"))
    );
    assert_eq!(
        ParseError::InvalidHeader.status(),
        Some((StatusCode::BadRequest, "Bad header"))
    );
    assert_eq!(
        ParseError::BodyNotAllowed.status(),
        Some((StatusCode::BadRequest, "body"))
    );
    assert_eq!(
        ParseError::DuplicatedHeader("server").status(),
        Some((StatusCode::BadRequest, "Duplicated"))
    );
    assert_eq!(
        ParseError::BadResource.status(),
        Some((StatusCode::NotFound, "Bad resource"))
    );
    assert_eq!(
        ParseError::InvalidRequest.status(),
        Some((StatusCode::BadRequest, "Bad request"))
    );
}

#[test]
fn test_only_bad_resource_keeps_connection() {
    assert!(!ParseError::BadResource.closes_connection());
    assert!(ParseError::InvalidRequest.closes_connection());
    assert!(ParseError::LineTooLong.closes_connection());
    assert!(ParseError::DuplicatedHeader("connection").closes_connection());
}
