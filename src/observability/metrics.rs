//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sink_requests_total` (counter): requests by method bucket
//! - `sink_request_bytes_total` (counter): estimated request bytes
//! - `sink_tracked_hosts` (gauge): distinct hosts in the registry
//! - `sink_active_connections` (gauge): open client connections
//!
//! # Design Decisions
//! - No per-host labels; host cardinality is unbounded
//! - Recording without an installed exporter is a no-op

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::stats::classify::MethodCategory;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    describe_counter!("sink_requests_total", "Requests answered, by method bucket");
    describe_counter!("sink_request_bytes_total", "Estimated bytes received");
    describe_gauge!("sink_tracked_hosts", "Distinct hosts in the stats registry");
    describe_gauge!("sink_active_connections", "Open client connections");

    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

/// Record one answered request.
pub fn record_request(method: MethodCategory, bytes: u64) {
    counter!("sink_requests_total", "method" => method.as_str()).increment(1);
    counter!("sink_request_bytes_total").increment(bytes);
}

/// Record the number of distinct hosts seen so far.
pub fn record_tracked_hosts(count: usize) {
    gauge!("sink_tracked_hosts").set(count as f64);
}

/// Record the number of open client connections.
pub fn record_active_connections(count: u64) {
    gauge!("sink_active_connections").set(count as f64);
}
