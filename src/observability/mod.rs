//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request path and stats reporter produce:
//!     → logging.rs (structured log events, periodic stats lines)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Stats lines are ordinary `info` events on the `mirror_sink::stats` target
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;
