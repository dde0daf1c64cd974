//! Periodic throughput reporting.
//!
//! # Responsibilities
//! - Read registry snapshots on a fixed interval
//! - Diff them against the previous tick to get interval rates
//! - Rank hosts by interval volume and log the top of the list
//! - Log one cumulative summary at shutdown
//!
//! # Design Decisions
//! - The baseline is private to the single reporter task, no locking
//! - Deltas saturate at zero; the reporter never panics on odd input
//! - Rates use the configured interval, not the measured one

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::StatsConfig;
use crate::observability::metrics;
use crate::stats::registry::{HostSnapshot, MethodTotals, StatsRegistry, Totals};

/// One host's share of an interval.
#[derive(Debug, Clone, PartialEq)]
pub struct HostLine {
    pub host: String,
    pub requests_per_sec: u64,
    pub avg_request_bytes: f64,
    pub interval: HostSnapshot,
}

/// Everything printed for one reporting tick.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalReport {
    pub requests_per_sec: u64,
    pub bytes_per_sec: u64,
    pub avg_request_bytes: f64,
    pub interval: Totals,
    pub totals: Totals,
    pub methods: MethodTotals,
    pub uptime: Duration,
    pub tracked_hosts: usize,
    pub top_hosts: Vec<HostLine>,
}

impl IntervalReport {
    /// Log the summary line followed by one line per ranked host.
    pub fn emit(&self) {
        tracing::info!(
            target: "mirror_sink::stats",
            req_per_sec = self.requests_per_sec,
            bytes_per_sec = self.bytes_per_sec,
            avg_req_bytes = round_tenth(self.avg_request_bytes),
            total_requests = self.totals.requests,
            total_bytes = self.totals.bytes,
            get = self.methods.get,
            post = self.methods.post,
            other = self.methods.other,
            hosts = self.tracked_hosts,
            uptime = %format_uptime(self.uptime),
            "stats"
        );

        for line in &self.top_hosts {
            tracing::info!(
                target: "mirror_sink::stats",
                host = %line.host,
                req_per_sec = line.requests_per_sec,
                avg_req_bytes = round_tenth(line.avg_request_bytes),
                interval_requests = line.interval.requests,
                interval_bytes = line.interval.bytes,
                "host stats"
            );
        }
    }
}

/// Cumulative summary logged once at shutdown.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
    pub totals: Totals,
    pub methods: MethodTotals,
    pub avg_request_bytes: f64,
    pub tracked_hosts: usize,
    pub uptime: Duration,
}

impl FinalReport {
    /// Read the registry as it stands right now.
    pub fn capture(registry: &StatsRegistry, started: Instant) -> Self {
        let totals = registry.snapshot_totals();
        Self {
            totals,
            methods: registry.snapshot_methods(),
            avg_request_bytes: average(totals.bytes, totals.requests),
            tracked_hosts: registry.host_count(),
            uptime: started.elapsed(),
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            target: "mirror_sink::stats",
            total_requests = self.totals.requests,
            total_bytes = self.totals.bytes,
            avg_req_bytes = round_tenth(self.avg_request_bytes),
            get = self.methods.get,
            post = self.methods.post,
            other = self.methods.other,
            hosts = self.tracked_hosts,
            uptime = %format_uptime(self.uptime),
            "final totals"
        );
    }
}

/// Timer-driven reporter. Owns the previous-tick baseline.
pub struct StatsReporter {
    registry: Arc<StatsRegistry>,
    interval: Duration,
    top_hosts: usize,
    started: Instant,
    previous: Totals,
    previous_hosts: HashMap<String, HostSnapshot>,
}

impl StatsReporter {
    pub fn new(registry: Arc<StatsRegistry>, config: &StatsConfig, started: Instant) -> Self {
        Self {
            registry,
            interval: Duration::from_millis(config.interval_ms),
            top_hosts: config.top_hosts,
            started,
            previous: Totals::default(),
            previous_hosts: HashMap::new(),
        }
    }

    /// Compute one report and advance the baseline.
    pub fn tick(&mut self) -> IntervalReport {
        let current = self.registry.snapshot_totals();
        let methods = self.registry.snapshot_methods();

        let interval = Totals {
            requests: current.requests.saturating_sub(self.previous.requests),
            bytes: current.bytes.saturating_sub(self.previous.bytes),
        };

        let mut ranked = Vec::new();
        for (host, now) in self.registry.snapshot_hosts() {
            let before = self.previous_hosts.get(&host).copied().unwrap_or_default();
            let delta = HostSnapshot {
                requests: now.requests.saturating_sub(before.requests),
                bytes: now.bytes.saturating_sub(before.bytes),
            };

            if delta.requests > 0 {
                ranked.push(HostLine {
                    host: host.clone(),
                    requests_per_sec: per_second(delta.requests, self.interval),
                    avg_request_bytes: average(delta.bytes, delta.requests),
                    interval: delta,
                });
            }
            self.previous_hosts.insert(host, now);
        }

        ranked.sort_unstable_by(|a, b| b.interval.requests.cmp(&a.interval.requests));
        ranked.truncate(self.top_hosts);

        self.previous = current;
        let tracked_hosts = self.previous_hosts.len();
        metrics::record_tracked_hosts(tracked_hosts);

        IntervalReport {
            requests_per_sec: per_second(interval.requests, self.interval),
            bytes_per_sec: per_second(interval.bytes, self.interval),
            avg_request_bytes: average(interval.bytes, interval.requests),
            interval,
            totals: current,
            methods,
            uptime: self.started.elapsed(),
            tracked_hosts,
            top_hosts: ranked,
        }
    }

    /// Report every interval until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            top_hosts = self.top_hosts,
            "Stats reporter starting"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().emit();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Stats reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Per-second rate of `delta` over `interval`.
///
/// The interval is truncated to whole seconds. Below one second the raw
/// delta is returned instead of dividing by zero.
pub fn per_second(delta: u64, interval: Duration) -> u64 {
    match interval.as_secs() {
        0 => delta,
        secs => delta / secs,
    }
}

fn average(bytes: u64, requests: u64) -> f64 {
    if requests == 0 {
        0.0
    } else {
        bytes as f64 / requests as f64
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Render a duration truncated to whole seconds, e.g. `1h2m3s`.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
