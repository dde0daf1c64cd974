//! Mirror Sink Library
//!
//! An HTTP endpoint that accepts mirrored load-balancer traffic, answers
//! every request with `200 OK` and periodically logs traffic statistics.

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod stats;

pub use config::schema::SinkConfig;
pub use http::SinkServer;
pub use lifecycle::Shutdown;
pub use stats::StatsRegistry;
