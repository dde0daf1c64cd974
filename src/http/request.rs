//! Request inspection.
//!
//! # Responsibilities
//! - Extract the host a request was addressed to
//! - Measure header, target and body sizes for the size estimate
//!
//! # Design Decisions
//! - Sizes are reconstructed from parsed parts, not counted on the wire
//! - The body is streamed and counted, never buffered
//! - A failed or timed-out body read ends counting; the request still counts

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, Uri};
use futures_util::StreamExt;

use crate::stats::classify::RequestSizes;

/// Host the request was addressed to: the Host header, else the URI
/// authority, else empty.
pub fn host_of(parts: &Parts) -> &str {
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or("")
}

/// Size of the header block: `name: value\r\n` per header plus the blank line.
pub fn header_block_len(headers: &HeaderMap) -> u64 {
    let fields: usize = headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum();
    (fields + 2) as u64
}

/// Length of the request-target as the client sent it.
pub fn request_target_len(uri: &Uri) -> u64 {
    if uri.scheme().is_some() {
        // absolute-form
        uri.to_string().len() as u64
    } else if let Some(path_and_query) = uri.path_and_query() {
        path_and_query.as_str().len() as u64
    } else {
        // authority-form (CONNECT)
        uri.authority().map_or(0, |a| a.as_str().len()) as u64
    }
}

/// Drain the body, returning how many bytes arrived.
pub async fn count_body_bytes(body: Body) -> u64 {
    let mut stream = body.into_data_stream();
    let mut total = 0u64;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => total += bytes.len() as u64,
            Err(e) => {
                tracing::debug!(error = %e, bytes_read = total, "Request body read ended early");
                break;
            }
        }
    }
    total
}

/// Byte lengths of a request whose body carried `body` bytes.
pub fn request_sizes(parts: &Parts, body: u64) -> RequestSizes {
    RequestSizes {
        header: header_block_len(&parts.headers),
        body,
        method: parts.method.as_str().len() as u64,
        uri: request_target_len(&parts.uri),
    }
}
