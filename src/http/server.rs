//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the catch-all sink handler
//! - Wire up middleware (request body timeout)
//! - Serve HTTP/1.1 connections with header-read, idle and write timeouts
//! - Fold every request into the stats registry
//! - Stop accepting and drain connections on shutdown

use axum::{
    extract::{Request, State},
    response::Response,
    Router,
};
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tower_http::timeout::RequestBodyTimeoutLayer;

use crate::config::{SinkConfig, TimeoutConfig};
use crate::http::request::{count_body_bytes, host_of, request_sizes};
use crate::http::response;
use crate::net::{ConnectionTracker, DeadlineStream, Listener};
use crate::observability::metrics;
use crate::stats::classify::classify;
use crate::stats::registry::StatsRegistry;

/// Pause after a failed accept (e.g. file descriptor exhaustion).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Errors from running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{remaining} connections still open after {grace:?} grace period")]
    DrainTimeout { remaining: u64, grace: Duration },
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StatsRegistry>,
}

/// HTTP server that answers everything with `200 OK`.
pub struct SinkServer {
    router: Router,
    timeouts: TimeoutConfig,
    grace_period: Duration,
}

impl SinkServer {
    /// Create a new server recording into `registry`.
    pub fn new(config: &SinkConfig, registry: Arc<StatsRegistry>) -> Self {
        let state = AppState { registry };
        let router = Self::build_router(config, state);
        Self {
            router,
            timeouts: config.timeouts.clone(),
            grace_period: config.shutdown.grace_period(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &SinkConfig, state: AppState) -> Router {
        Router::new()
            .fallback(sink_handler)
            .with_state(state)
            .layer(RequestBodyTimeoutLayer::new(config.timeouts.read()))
    }

    /// The request router, without the connection layer.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain open connections.
    ///
    /// Returns an error when connections are still open after the grace
    /// period; the caller decides what to do with it.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            read_timeout_ms = self.timeouts.read_ms,
            write_timeout_ms = self.timeouts.write_ms,
            idle_timeout_ms = self.timeouts.idle_ms,
            "HTTP server starting"
        );

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.timeouts.read())
            .keep_alive(true);

        let graceful = GracefulShutdown::new();
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::trace!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let io = TokioIo::new(DeadlineStream::new(
                        stream,
                        self.timeouts.idle(),
                        self.timeouts.write(),
                    ));
                    let service = TowerToHyperService::new(self.router.clone());
                    let conn = graceful.watch(builder.serve_connection(io, service));
                    let guard = tracker.track();

                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            tracing::debug!(
                                connection_id = %guard.id(),
                                peer = %peer,
                                error = %err,
                                "Connection error"
                            );
                        }
                        drop(guard);
                        drop(permit);
                    });
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, draining connections...");
                    break;
                }
            }
        }

        // Stop accepting before waiting on the stragglers.
        drop(listener);
        tracing::info!(
            open_connections = tracker.active_count(),
            grace_period_ms = self.grace_period.as_millis() as u64,
            "Listener closed"
        );

        tokio::select! {
            _ = graceful.shutdown() => {
                tracing::info!("HTTP server stopped");
                Ok(())
            }
            _ = tokio::time::sleep(self.grace_period) => {
                Err(ServerError::DrainTimeout {
                    remaining: tracker.active_count(),
                    grace: self.grace_period,
                })
            }
        }
    }
}

/// Catch-all handler: record the request, answer `200 OK`.
async fn sink_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body_len = count_body_bytes(body).await;

    let classified = classify(
        host_of(&parts),
        parts.method.as_str(),
        &request_sizes(&parts, body_len),
    );
    state.registry.record(&classified);
    metrics::record_request(classified.method, classified.size_estimate);

    response::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::stats::classify::{RequestSizes, NO_HOST};
    use crate::stats::registry::{HostSnapshot, MethodTotals};

    fn server() -> (SinkServer, Arc<StatsRegistry>) {
        let registry = Arc::new(StatsRegistry::new());
        (SinkServer::new(&SinkConfig::default(), registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_any_method_any_path_is_ok() {
        let (server, registry) = server();

        let cases = [
            ("GET", "/"),
            ("POST", "/a/b?c=1"),
            ("PURGE", "/cache"),
            ("get", "/x"),
        ];
        for (method, path) in cases {
            let request = Request::builder()
                .method(Method::from_bytes(method.as_bytes()).unwrap())
                .uri(path)
                .header("host", "Mirror.Example")
                .body(Body::empty())
                .unwrap();

            let response = server.router().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()["content-type"],
                "text/plain; charset=utf-8"
            );
            let body = to_bytes(response.into_body(), 16).await.unwrap();
            assert_eq!(&body[..], b"OK");
        }

        assert_eq!(registry.snapshot_totals().requests, 4);
        assert_eq!(
            registry.snapshot_methods(),
            MethodTotals { get: 1, post: 1, other: 2 }
        );
        assert_eq!(registry.load_or_create_host("mirror.example").snapshot().requests, 4);
        assert_eq!(registry.host_count(), 1);
    }

    #[tokio::test]
    async fn test_size_estimate_includes_body() {
        let (server, registry) = server();

        let request = Request::builder()
            .method("POST")
            .uri("/submit")
            .header("host", "a.b")
            .body(Body::from("hello"))
            .unwrap();
        server.router().oneshot(request).await.unwrap();

        // "host: a.b\r\n" + CRLF = 13, body 5, "POST" 4, "/submit" 7, overhead 11
        let expected = RequestSizes { header: 13, body: 5, method: 4, uri: 7 }.estimate();
        assert_eq!(expected, 40);
        assert_eq!(
            registry.load_or_create_host("a.b").snapshot(),
            HostSnapshot { requests: 1, bytes: expected }
        );
        assert_eq!(registry.snapshot_totals().bytes, expected);
    }

    #[tokio::test]
    async fn test_missing_host_uses_placeholder() {
        let (server, registry) = server();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let hosts = registry.snapshot_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].0, NO_HOST);
    }
}
