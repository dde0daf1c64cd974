//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net)
//!     → server.rs (hyper HTTP/1 connection, axum fallback handler)
//!     → request.rs (host, method, byte lengths)
//!     → stats::classify → stats::registry
//!     → response.rs (fixed 200 OK)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, ServerError, SinkServer};
