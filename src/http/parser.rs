use std::collections::HashMap;

use thiserror::Error;

use crate::http::request::{lookup, Method};

/// Errors found while parsing a request head.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed request: '{0}'")]
    MalformedRequestLine(String),
    #[error("Unsupported method: '{0}'")]
    UnsupportedMethod(String),
    #[error("Malformed header: '{0}'")]
    InvalidHeader(String),
    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("Invalid Content-Length: '{0}'")]
    InvalidContentLength(String),
}

/// The request line and header block of a request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// Request target exactly as sent, e.g. `/review?startAt=0`
    pub target: String,
    pub version: String,
    pub headers: HashMap<String, String>,
}

impl RequestHead {
    pub fn header(&self, key: &str) -> Option<&str> {
        lookup(&self.headers, key)
    }

    /// Number of body bytes that follow this head.
    ///
    /// Only POST requests carry a body; for any other method the header is
    /// ignored.
    pub fn body_length(&self) -> Result<usize, ParseError> {
        if self.method != Method::POST {
            return Ok(0);
        }
        match self.header("Content-Length") {
            None => Ok(0),
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(v.to_string())),
        }
    }
}

/// Parses everything before the `\r\n\r\n` separator.
pub fn parse_head(buf: &[u8]) -> Result<RequestHead, ParseError> {
    let head = std::str::from_utf8(buf).map_err(|_| ParseError::InvalidEncoding)?;

    let (request_line, header_block) = head.split_once("\r\n").unwrap_or((head, ""));

    // Request line: exactly METHOD SP URL SP VERSION
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method_str, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine(request_line.to_string()));
    };

    let method = Method::from_str(&method_str.to_ascii_uppercase())
        .ok_or_else(|| ParseError::UnsupportedMethod(method_str.to_string()))?;

    let mut headers = HashMap::new();

    for line in header_block.split("\r\n") {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(RequestHead {
        method,
        target: target.to_string(),
        version: version.to_string(),
        headers,
    })
}
