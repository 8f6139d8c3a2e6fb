use trainer::http::response::{Response, ResponseHead, StatusCode};

#[test]
fn test_status_codes() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
}

#[test]
fn test_head_carries_standard_headers() {
    let head = ResponseHead::new(StatusCode::Ok, "text/html");
    assert_eq!(head.get("connection"), Some("close"));
    assert_eq!(head.get("Content-Type"), Some("text/html"));
    assert!(head.get("Date").is_some_and(|d| d.ends_with(" GMT")));

    let text = String::from_utf8(head.to_bytes()).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn test_response_sets_content_length() {
    let response = Response::new(ResponseHead::new(StatusCode::Ok, "text/plain"), "hello");
    assert_eq!(response.head.get("Content-Length"), Some("5"));
    assert!(response.to_bytes().ends_with(b"\r\n\r\nhello"));
}

#[test]
fn test_error_pages_escape_messages() {
    let response = Response::bad_request("Malformed request: '<x>'");
    let text = String::from_utf8(response.to_bytes()).unwrap();
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(text.contains("<p>400 Malformed request: &#39;&lt;x&gt;&#39;</p>"));

    let missing = Response::not_found("/nowhere");
    assert_eq!(missing.head.status, StatusCode::NotFound);
    assert!(String::from_utf8_lossy(&missing.body).contains("/nowhere"));
}
