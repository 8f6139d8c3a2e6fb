use chrono::{Duration, Utc};

use crate::http::response::{http_date, Response, ResponseHead, StatusCode};

/// The one path served from memory instead of by a page handler.
pub const HELMET_PATH: &str = "/helmet.gif";

const HELMET: &[u8] = include_bytes!("../../assets/helmet.gif");

/// The banner image, cacheable for an hour.
pub fn helmet() -> Response {
    let expires = http_date(Utc::now() + Duration::hours(1));
    let head = ResponseHead::new(StatusCode::Ok, "image/gif").header("Expires", expires);
    Response::new(head, HELMET)
}
