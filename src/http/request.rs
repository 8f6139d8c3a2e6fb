use std::borrow::Cow;
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use url::Url;

use crate::http::body::{self, DecodeError};
use crate::http::framer::FramedRequest;

/// Methods the trainer answers.
///
/// The trainer only serves pages over GET and accepts form submissions over
/// POST; HEAD is tolerated and answered like GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a page
    GET,
    /// POST - Submit a form
    POST,
    /// HEAD - Like GET
    HEAD,
}

impl Method {
    /// Parses an upper-case method token.
    ///
    /// # Example
    ///
    /// ```
    /// # use trainer::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "HEAD" => Some(Method::HEAD),
            _ => None,
        }
    }
}

/// A decoded form field.
///
/// Multipart parts carrying a `filename` keep their bytes verbatim; every
/// other field is text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File { filename: String, content: Bytes },
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::File { .. } => None,
        }
    }

    /// Text view of the value; file contents are decoded lossily.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(text) => Cow::Borrowed(text),
            FieldValue::File { content, .. } => String::from_utf8_lossy(content),
        }
    }

    /// Raw bytes of the value.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            FieldValue::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            FieldValue::File { content, .. } => content.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::File { content, .. } => content.is_empty(),
        }
    }
}

/// Flat parameter mapping handed to page handlers.
///
/// Every name maps to a single value. Within one source the first occurrence
/// wins; [`Params::overlay`] lets a later source replace earlier values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    fields: BTreeMap<String, FieldValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` unless `name` is already present.
    pub fn insert_first(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.entry(name.into()).or_insert(value);
    }

    /// Copies every field of `other` over this mapping, replacing collisions.
    pub fn overlay(&mut self, other: Params) {
        self.fields.extend(other.fields);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a field. File uploads are not returned here.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Fields in ascending name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The message a user supplied through the upload forms: the `file` field
    /// when it is non-empty, else the pasted `text` field. Uploaded bytes are
    /// returned untouched.
    pub fn message_content(&self) -> Option<Bytes> {
        ["file", "text"]
            .iter()
            .filter_map(|name| self.get(name))
            .find(|value| !value.is_empty())
            .map(FieldValue::to_bytes)
    }
}

/// A fully decoded HTTP request, as seen by the router and handlers.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path of the target without its query, e.g. `/review`
    pub path: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    /// Query fields overlaid with body fields.
    pub params: Params,
}

impl Request {
    /// Decodes a framed request: splits the target into path and query and
    /// merges query parameters with the decoded body, body fields winning.
    pub fn from_framed(framed: FramedRequest) -> Result<Self, DecodeError> {
        let FramedRequest { head, body } = framed;

        let base = Url::parse("http://localhost/").map_err(|_| DecodeError::InvalidTarget(head.target.clone()))?;
        let url = base
            .join(&head.target)
            .map_err(|_| DecodeError::InvalidTarget(head.target.clone()))?;

        let mut params = url
            .query()
            .map(|query| body::decode_urlencoded(query.as_bytes()))
            .unwrap_or_default();

        if !body.is_empty() {
            let content_type = lookup(&head.headers, "Content-Type");
            params.overlay(body::decode_form(&body, content_type)?);
        }

        Ok(Request {
            method: head.method,
            path: url.path().to_string(),
            version: head.version,
            headers: head.headers,
            params,
        })
    }

    /// Retrieves a header value by name, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        lookup(&self.headers, key)
    }
}

pub(crate) fn lookup<'a>(headers: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}
