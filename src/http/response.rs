//! The fixed response every request receives.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const OK_BODY: &str = "OK";
pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// `200 OK`, `text/plain`, body `OK`. No server banner.
pub fn ok() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE))],
        OK_BODY,
    )
        .into_response()
}
