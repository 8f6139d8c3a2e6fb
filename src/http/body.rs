//! Form body decoding.
//!
//! Bodies are decoded into a flat [`Params`] mapping. `multipart/form-data`
//! is split on its boundary; anything else is treated as
//! `application/x-www-form-urlencoded`.

use bytes::Bytes;
use memchr::memmem;
use thiserror::Error;
use url::form_urlencoded;

use crate::http::request::{FieldValue, Params};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid request target: '{0}'")]
    InvalidTarget(String),
    #[error("multipart/form-data without a boundary")]
    MissingBoundary,
    #[error("Malformed multipart body: {0}")]
    MalformedMultipart(&'static str),
}

/// Decodes a request body according to its `Content-Type` header.
pub fn decode_form(body: &Bytes, content_type: Option<&str>) -> Result<Params, DecodeError> {
    let (mime, parameters) = content_type.map(parse_content_type).unwrap_or_default();

    if mime == "multipart/form-data" {
        let boundary = parameters
            .into_iter()
            .find(|(name, _)| name == "boundary")
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
            .ok_or(DecodeError::MissingBoundary)?;
        decode_multipart(body, &boundary)
    } else {
        Ok(decode_urlencoded(body))
    }
}

/// Decodes `application/x-www-form-urlencoded` input, keeping blank values.
pub fn decode_urlencoded(input: &[u8]) -> Params {
    let mut params = Params::new();
    for (name, value) in form_urlencoded::parse(input) {
        params.insert_first(name, FieldValue::Text(value.into_owned()));
    }
    params
}

/// Splits a `multipart/form-data` body on `boundary`.
///
/// Parts with a `filename` disposition parameter keep their raw bytes; parts
/// without a `name` are ignored.
pub fn decode_multipart(body: &Bytes, boundary: &str) -> Result<Params, DecodeError> {
    let delimiter = format!("--{boundary}");
    let separator = format!("\r\n--{boundary}");
    let separator_finder = memmem::Finder::new(separator.as_bytes());

    let mut pos = memmem::find(body, delimiter.as_bytes())
        .ok_or(DecodeError::MalformedMultipart("missing opening boundary"))?
        + delimiter.len();

    let mut params = Params::new();

    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            break;
        }

        // Skip transport padding up to the end of the delimiter line.
        let line_end = memmem::find(rest, b"\r\n")
            .ok_or(DecodeError::MalformedMultipart("truncated boundary line"))?;
        pos += line_end + 2;

        let part_len = separator_finder
            .find(&body[pos..])
            .ok_or(DecodeError::MalformedMultipart("unterminated part"))?;

        decode_part(body.slice(pos..pos + part_len), &mut params)?;
        pos += part_len + separator.len();
    }

    Ok(params)
}

fn decode_part(part: Bytes, params: &mut Params) -> Result<(), DecodeError> {
    let (headers, content) = if part.starts_with(b"\r\n") {
        ("", part.slice(2..))
    } else {
        let end = memmem::find(&part, b"\r\n\r\n")
            .ok_or(DecodeError::MalformedMultipart("part without header terminator"))?;
        let headers = std::str::from_utf8(&part[..end])
            .map_err(|_| DecodeError::MalformedMultipart("part headers are not UTF-8"))?;
        (headers, part.slice(end + 4..))
    };

    let disposition = headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("Content-Disposition")
            .then(|| value.trim())
    });
    let Some(disposition) = disposition else {
        return Ok(());
    };

    let (_, parameters) = parse_content_type(disposition);
    let mut name = None;
    let mut filename = None;
    for (key, value) in parameters {
        match key.as_str() {
            "name" => name = Some(value),
            "filename" => filename = Some(value),
            _ => {}
        }
    }

    let Some(name) = name else {
        return Ok(());
    };

    let value = match filename {
        Some(filename) => FieldValue::File { filename, content },
        None => FieldValue::Text(String::from_utf8_lossy(&content).into_owned()),
    };
    params.insert_first(name, value);
    Ok(())
}

/// Splits a header value such as `multipart/form-data; boundary="x"` into a
/// lowercased main value and its parameters. Parameter names are lowercased;
/// quoted values are unquoted.
pub fn parse_content_type(value: &str) -> (String, Vec<(String, String)>) {
    let mut pieces = split_unquoted(value, ';').into_iter();
    let main = pieces.next().unwrap_or_default().trim().to_ascii_lowercase();

    let parameters = pieces
        .filter_map(|piece| {
            let (name, value) = piece.split_once('=')?;
            Some((name.trim().to_ascii_lowercase(), unquote(value.trim())))
        })
        .collect();

    (main, parameters)
}

fn split_unquoted(value: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c == separator && !quoted => {
                pieces.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&value[start..]);
    pieces
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parameters() {
        let (mime, params) = parse_content_type("Multipart/Form-Data; Boundary=\"a;b\"");
        assert_eq!(mime, "multipart/form-data");
        assert_eq!(params, vec![("boundary".to_string(), "a;b".to_string())]);
    }

    #[test]
    fn blank_values_are_kept() {
        let params = decode_urlencoded(b"word=&go=");
        assert_eq!(params.text("word"), Some(""));
        assert_eq!(params.text("go"), Some(""));
    }
}
