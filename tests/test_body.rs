mod common;

use bytes::Bytes;
use trainer::http::body::{decode_form, decode_urlencoded, parse_content_type, DecodeError};
use trainer::http::request::{FieldValue, Method};
use url::form_urlencoded;

#[test]
fn test_urlencoded_form() {
    let params = decode_urlencoded(b"which=Train+as+Spam&text=Hello");

    assert_eq!(params.len(), 2);
    assert_eq!(params.text("which"), Some("Train as Spam"));
    assert_eq!(params.text("text"), Some("Hello"));
}

#[test]
fn test_urlencoded_reserved_characters() {
    let encoded = form_urlencoded::Serializer::new(String::new())
        .append_pair("text", "a&b=c d%")
        .append_pair("blank", "")
        .finish();

    let params = decode_urlencoded(encoded.as_bytes());
    assert_eq!(params.text("text"), Some("a&b=c d%"));
    assert_eq!(params.text("blank"), Some(""));
}

#[test]
fn test_first_value_wins() {
    let params = decode_urlencoded(b"word=first&word=second");
    assert_eq!(params.text("word"), Some("first"));
}

#[test]
fn test_multipart_file_and_text() {
    let mut body = Vec::new();
    body.extend_from_slice(b"preamble\r\n--XyZ\r\n");
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"; filename=\"box.mbox\"\r\n");
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(b"\x00\xffbinary\r\n--not-the-boundary");
    body.extend_from_slice(b"\r\n--XyZ\r\n");
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"which\"\r\n\r\n");
    body.extend_from_slice(b"Train as Ham");
    body.extend_from_slice(b"\r\n--XyZ\r\n");
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\nno name here");
    body.extend_from_slice(b"\r\n--XyZ--\r\n");

    let params = decode_form(&Bytes::from(body), Some("multipart/form-data; boundary=\"XyZ\"")).unwrap();

    assert_eq!(params.len(), 2);
    assert_eq!(params.text("which"), Some("Train as Ham"));
    match params.get("file") {
        Some(FieldValue::File { filename, content }) => {
            assert_eq!(filename, "box.mbox");
            assert_eq!(&content[..], b"\x00\xffbinary\r\n--not-the-boundary");
        }
        other => panic!("unexpected file field: {other:?}"),
    }
}

#[test]
fn test_multipart_without_boundary() {
    let err = decode_form(&Bytes::from_static(b"x"), Some("multipart/form-data")).unwrap_err();
    assert_eq!(err, DecodeError::MissingBoundary);
}

#[test]
fn test_multipart_unterminated() {
    let body = Bytes::from_static(b"--b\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue");
    let err = decode_form(&body, Some("multipart/form-data; boundary=b")).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedMultipart(_)));
}

#[test]
fn test_content_type_parameters() {
    let (mime, params) = parse_content_type("Multipart/Form-Data; Boundary=\"a;b\"; charset=utf-8");
    assert_eq!(mime, "multipart/form-data");
    assert_eq!(
        params,
        vec![
            ("boundary".to_string(), "a;b".to_string()),
            ("charset".to_string(), "utf-8".to_string()),
        ]
    );
}

#[test]
fn test_body_fields_override_query() {
    let raw = b"POST /wordquery?word=query&extra=1 HTTP/1.1\r\n\
        Content-Type: application/x-www-form-urlencoded\r\n\
        Content-Length: 9\r\n\r\nword=body";
    let req = common::request(raw);

    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/wordquery");
    assert_eq!(req.params.text("word"), Some("body"));
    assert_eq!(req.params.text("extra"), Some("1"));
}

#[test]
fn test_message_content_prefers_file() {
    let mut params = decode_urlencoded(b"text=pasted");
    assert_eq!(params.message_content().as_deref(), Some(&b"pasted"[..]));

    params.insert_first(
        "file",
        FieldValue::File {
            filename: "m.eml".to_string(),
            content: Bytes::from_static(b"uploaded"),
        },
    );
    assert_eq!(params.message_content().as_deref(), Some(&b"uploaded"[..]));

    let empty_file = {
        let mut p = decode_urlencoded(b"text=pasted");
        p.insert_first(
            "file",
            FieldValue::File {
                filename: String::new(),
                content: Bytes::new(),
            },
        );
        p
    };
    assert_eq!(empty_file.message_content().as_deref(), Some(&b"pasted"[..]));
}
