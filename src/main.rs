//! Mirror Sink (v1)
//!
//! An always-OK HTTP endpoint for mirrored load-balancer traffic.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 MIRROR SINK                  │
//!                        │                                              │
//!   Mirrored request     │  ┌─────────┐    ┌─────────┐    ┌──────────┐  │
//!   ─────────────────────┼─▶│   net   │───▶│  http   │───▶│  stats   │  │
//!                        │  │listener │    │ server  │    │ registry │  │
//!                        │  └─────────┘    └────┬────┘    └────┬─────┘  │
//!   200 OK               │                      │              │        │
//!   ◀────────────────────┼──────────────────────┘              ▼        │
//!                        │                              ┌──────────────┐│
//!                        │                              │   reporter   ││──▶ log
//!                        │                              └──────────────┘│
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │ config · observability · lifecycle     │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::sync::Arc;
use std::time::Instant;

use mirror_sink::cli::Cli;
use mirror_sink::http::{ServerError, SinkServer};
use mirror_sink::lifecycle::{signals, Shutdown};
use mirror_sink::net::Listener;
use mirror_sink::observability::{logging, metrics};
use mirror_sink::stats::{FinalReport, StatsRegistry, StatsReporter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from this config, so it is not up yet.
            eprintln!("mirror-sink: {e}");
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        stats_interval_ms = config.stats.interval_ms,
        top_hosts = config.stats.top_hosts,
        "mirror-sink starting"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(
                metrics_address = %addr,
                error = %e,
                "Failed to start metrics exporter"
            );
            return Err(e.into());
        }
    }

    let listener = match Listener::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to bind listener");
            return Err(e.into());
        }
    };

    let started = Instant::now();
    let registry = Arc::new(StatsRegistry::with_host_limit(config.stats.max_tracked_hosts));
    let shutdown = Shutdown::new();

    // Every receiver must exist before the signal task can fire.
    let reporter = StatsReporter::new(registry.clone(), &config.stats, started);
    let reporter_handle = tokio::spawn(reporter.run(shutdown.subscribe()));
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let signal = signals::wait_for_termination().await;
        tracing::info!(signal, "Termination signal received");
        signal_shutdown.trigger();
    });

    let server = SinkServer::new(&config, registry.clone());
    match server.run(listener, server_shutdown).await {
        Ok(()) => {}
        Err(e @ ServerError::DrainTimeout { .. }) => {
            tracing::warn!(error = %e, "Connection drain incomplete");
        }
        Err(e) => tracing::error!(error = %e, "HTTP server failed"),
    }

    // The server can stop before any signal arrives; the reporter still has to exit.
    shutdown.trigger();

    if let Err(e) = reporter_handle.await {
        tracing::error!(error = %e, "Stats reporter task failed");
    }
    FinalReport::capture(&registry, started).emit();

    tracing::info!("Shutdown complete");
    Ok(())
}
