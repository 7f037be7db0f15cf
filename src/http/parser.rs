use tokio::io::AsyncBufRead;

use crate::http::line::{read_line, Line, LineError, ReadLine};
use crate::http::request::{Method, Request, RequestBuilder};
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Reasons a request is refused before it reaches the resolver.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("request line too long")]
    LineTooLong,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("request carries a body")]
    BodyNotAllowed,
    #[error("duplicated header field: {0}")]
    DuplicatedHeader(&'static str),
    /// The request line has a valid shape but the target contains
    /// characters this server never serves.
    #[error("unacceptable request target")]
    BadResource,
    #[error("malformed request")]
    InvalidRequest,
    #[error(transparent)]
    Io(std::io::Error),
}

impl ParseError {
    /// Status and reason phrase sent back for this rejection.
    ///
    /// Returns `None` for transport failures, where nothing can be sent.
    pub fn status(&self) -> Option<(StatusCode, &'static str)> {
        let status = match self {
            ParseError::LineTooLong => (StatusCode::NotFound, "Too big line"),
            ParseError::InvalidHeader => (StatusCode::BadRequest, "Bad header"),
            ParseError::BodyNotAllowed => (StatusCode::BadRequest, "body"),
            ParseError::DuplicatedHeader(_) => (StatusCode::BadRequest, "Duplicated"),
            ParseError::BadResource => (StatusCode::NotFound, "Bad resource"),
            ParseError::InvalidRequest => (StatusCode::BadRequest, "Bad request"),
            ParseError::Io(_) => return None,
        };
        Some(status)
    }

    /// Whether the connection must be closed after answering.
    pub fn closes_connection(&self) -> bool {
        !matches!(self, ParseError::BadResource)
    }
}

impl From<LineError> for ParseError {
    fn from(err: LineError) -> Self {
        match err {
            LineError::TooLong => ParseError::LineTooLong,
            LineError::Io(e) => ParseError::Io(e),
        }
    }
}

/// Occurrences of the header fields that may appear at most once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCounts {
    pub content_length: u32,
    pub content_type: u32,
    pub server: u32,
    pub connection: u32,
}

impl HeaderCounts {
    /// Records one header. `name` must already be lowercase.
    pub fn record(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        match name {
            "content-length" => {
                if leading_integer(value) != 0 {
                    return Err(ParseError::BodyNotAllowed);
                }
                self.content_length += 1;
            }
            "content-type" => self.content_type += 1,
            "server" => self.server += 1,
            "connection" => self.connection += 1,
            _ => {}
        }

        if self.content_length > 1 {
            return Err(ParseError::DuplicatedHeader("content-length"));
        }
        if self.content_type > 1 {
            return Err(ParseError::DuplicatedHeader("content-type"));
        }
        if self.server > 1 {
            return Err(ParseError::DuplicatedHeader("server"));
        }
        if self.connection > 1 {
            return Err(ParseError::DuplicatedHeader("connection"));
        }

        Ok(())
    }
}

/// Value of the integer prefix of `s`, `0` when there is none.
///
/// Leading whitespace and one sign are skipped, parsing stops at the first
/// non-digit. Saturates instead of overflowing.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));

    if negative { -magnitude } else { magnitude }
}

/// Splits a header line into field name and value.
///
/// The name is one or more ASCII letters or `-`. After the colon there must
/// be at least one byte, none of them CR or LF; leading spaces are not part
/// of the value.
pub fn parse_header_line(line: &Line) -> Result<(String, String), ParseError> {
    if !line.terminated {
        return Err(ParseError::InvalidHeader);
    }

    let colon = line
        .content
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParseError::InvalidHeader)?;
    let (name, rest) = (&line.content[..colon], &line.content[colon + 1..]);

    if name.is_empty() || !name.iter().all(|&b| b.is_ascii_alphabetic() || b == b'-') {
        return Err(ParseError::InvalidHeader);
    }
    if rest.is_empty() || rest.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Err(ParseError::InvalidHeader);
    }

    let start = rest.iter().position(|&b| b != b' ').unwrap_or(rest.len());
    let value = String::from_utf8_lossy(&rest[start..]).into_owned();
    // The name is pure ASCII at this point.
    let name = String::from_utf8_lossy(name).into_owned();

    Ok((name, value))
}

/// The lines of one request, read but not yet checked against the
/// request-line grammar.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// `None` when the block ended before any line arrived.
    pub request_line: Option<Line>,
    pub headers: Vec<(String, String)>,
    /// Whether the block was closed by a blank line rather than end of stream.
    pub complete: bool,
}

impl RequestHead {
    /// Whether the client sent `Connection: close`.
    pub fn requests_close(&self) -> bool {
        self.headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("connection") && v.trim().eq_ignore_ascii_case("close"))
    }
}

/// Reads one request head, checking each header line as it arrives.
///
/// Returns `Ok(None)` when the peer closes the stream before sending
/// anything. Header grammar, body and duplicate checks fail fast, before the
/// rest of the block is read.
pub async fn read_request_head<R>(reader: &mut R) -> Result<Option<RequestHead>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = RequestHead {
        request_line: None,
        headers: Vec::new(),
        complete: false,
    };
    let mut counts = HeaderCounts::default();

    loop {
        let line = match read_line(reader).await? {
            ReadLine::Line(line) => line,
            ReadLine::Blank => {
                head.complete = true;
                break;
            }
            ReadLine::Eof if head.request_line.is_none() => return Ok(None),
            ReadLine::Eof => break,
        };

        if head.request_line.is_none() {
            head.request_line = Some(line);
            continue;
        }

        let (name, value) = parse_header_line(&line)?;
        counts.record(&name.to_ascii_lowercase(), &value)?;
        head.headers.push((name, value));
    }

    Ok(Some(head))
}

/// Which characters the request target may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetRule {
    Strict,
    Lenient,
}

impl TargetRule {
    fn accepts(self, target: &str) -> bool {
        !target.is_empty()
            && match self {
                TargetRule::Strict => target
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'/')),
                TargetRule::Lenient => !target.bytes().any(|b| b.is_ascii_whitespace()),
            }
    }
}

/// Splits `METHOD SP TARGET SP HTTP/1.1` under the given target rule.
fn split_request_line(line: &Line, rule: TargetRule) -> Option<(&str, &str)> {
    if !line.terminated {
        return None;
    }

    let text = std::str::from_utf8(&line.content).ok()?;
    let mut parts = text.split(' ');
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;

    if parts.next().is_some() || method.is_empty() || version != HTTP_VERSION {
        return None;
    }
    if !rule.accepts(target) {
        return None;
    }

    Some((method, target))
}

/// Checks an assembled head against the strict grammar, falling back to the
/// lenient one to tell a bad target (404) from a bad request (400).
pub fn validate_request(head: RequestHead) -> Result<Request, ParseError> {
    let Some(line) = head.request_line.as_ref().filter(|_| head.complete) else {
        return Err(ParseError::InvalidRequest);
    };

    match split_request_line(line, TargetRule::Strict) {
        Some((method, target)) => RequestBuilder::new()
            .method(Method::parse(method))
            .target(target)
            .headers(head.headers)
            .build()
            .map_err(|_| ParseError::InvalidRequest),
        None if split_request_line(line, TargetRule::Lenient).is_some() => {
            Err(ParseError::BadResource)
        }
        None => Err(ParseError::InvalidRequest),
    }
}

/// Reads and validates one request from `reader`.
pub async fn parse_http_request<R>(reader: &mut R) -> Result<Option<Request>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    match read_request_head(reader).await? {
        Some(head) => validate_request(head).map(Some),
        None => Ok(None),
    }
}
