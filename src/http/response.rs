use chrono::{DateTime, Utc};

/// The statuses the trainer ever answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Numeric code for the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use trainer::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Formats a timestamp the way HTTP date headers expect.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Status line and headers of a response.
///
/// Every response carries `Connection: close`: the connection ends once the
/// response has been written, which also delimits bodies sent without a
/// `Content-Length`.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: StatusCode, content_type: &str) -> Self {
        Self {
            status,
            headers: vec![
                ("Connection".to_string(), "close".to_string()),
                ("Content-Type".to_string(), content_type.to_string()),
                ("Date".to_string(), http_date(Utc::now())),
            ],
        }
    }

    /// Adds a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.reason_phrase()
        )
        .into_bytes();

        for (k, v) in &self.headers {
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(v.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// A complete response with its body already in memory.
#[derive(Debug)]
pub struct Response {
    pub head: ResponseHead,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(head: ResponseHead, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let head = head.header("Content-Length", body.len().to_string());
        Self { head, body }
    }

    /// An HTML error page naming the status code and what went wrong.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = format!(
            "<html><body><p>{} {}</p></body></html>",
            status.as_u16(),
            crate::web::html::escape(message)
        );
        Self::new(ResponseHead::new(status, "text/html"), body)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error(StatusCode::BadRequest, message)
    }

    pub fn not_found(path: &str) -> Self {
        Self::error(StatusCode::NotFound, &format!("Not found: '{path}'"))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.head.to_bytes();
        buf.extend_from_slice(&self.body);
        buf
    }
}
