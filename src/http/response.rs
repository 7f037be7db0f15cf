use std::borrow::Cow;

use crate::resource::correlated::CorrelatedServer;

/// Value of the `Server` header on successful responses.
pub const SERVER_NAME: &str = "waypost";

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File served
/// - `Found` (302): Resource lives on a correlated server
/// - `BadRequest` (400): Malformed request or unreadable file
/// - `NotFound` (404): Resource missing or unacceptable
/// - `NotImplemented` (501): Method other than GET/HEAD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200
    Ok,
    /// 302
    Found,
    /// 400
    BadRequest,
    /// 404
    NotFound,
    /// 501
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use waypost::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Found => 302,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Reason phrase used when a response does not supply its own.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "Success",
            StatusCode::Found => "Another server",
            StatusCode::BadRequest => "Bad request",
            StatusCode::NotFound => "Not found",
            StatusCode::NotImplemented => "Method not available",
        }
    }

    /// Error statuses that tell the client the connection is going away.
    pub fn announces_close(&self) -> bool {
        matches!(self, StatusCode::BadRequest | StatusCode::NotImplemented)
    }
}

/// A complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub reason: Cow<'static, str>,
    /// Headers in the order they are written
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::NotFound)
///     .reason("Bad resource")
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    reason: Option<Cow<'static, str>>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Overrides the status code's default reason phrase.
    pub fn reason(mut self, reason: impl Into<Cow<'static, str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Appends a header. Headers are written in insertion order and are
    /// never merged.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response. No header is added implicitly.
    pub fn build(self) -> Response {
        Response {
            reason: self
                .reason
                .unwrap_or_else(|| Cow::Borrowed(self.status.reason_phrase())),
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// An error response without a body.
    ///
    /// 400 and 501 carry `Connection: close`; other statuses leave the
    /// connection decision to the caller.
    pub fn error(status: StatusCode, reason: impl Into<Cow<'static, str>>) -> Self {
        let builder = ResponseBuilder::new(status).reason(reason);

        if status.announces_close() {
            builder.header("Connection", "close").build()
        } else {
            builder.build()
        }
    }

    /// A 302 pointing at the correlated server that holds `target`.
    pub fn redirect(server: &CorrelatedServer, target: &str) -> Self {
        ResponseBuilder::new(StatusCode::Found)
            .header("Location", server.location(target))
            .build()
    }

    /// A 200 carrying a file.
    ///
    /// `Content-Length` always reports the full file size; the bytes are
    /// only attached when `with_body` is set (GET, not HEAD).
    pub fn file(contents: Vec<u8>, with_body: bool) -> Self {
        let builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Server", SERVER_NAME)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", contents.len().to_string());

        if with_body {
            builder.body(contents).build()
        } else {
            builder.build()
        }
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
