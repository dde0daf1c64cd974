//! Counter registry.
//!
//! Global, per-method and per-host counters shared by every request task
//! and the reporter. All counters are monotonic display counters updated
//! with `Relaxed` atomics; the host map is a sharded `DashMap`, so updates
//! for different hosts never serialize on a common lock.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::stats::classify::{Classified, MethodCategory};

/// Bucket that absorbs new hosts once the host limit is reached.
pub const OVERFLOW_HOST: &str = "(overflow)";

#[derive(Debug, Default)]
struct GlobalCounters {
    requests: AtomicU64,
    bytes: AtomicU64,
}

#[derive(Debug, Default)]
struct MethodCounters {
    get: AtomicU64,
    post: AtomicU64,
    other: AtomicU64,
}

/// Counters for a single host.
#[derive(Debug, Default)]
pub struct HostStats {
    requests: AtomicU64,
    bytes: AtomicU64,
}

impl HostStats {
    /// Count one request of `bytes` bytes.
    pub fn record(&self, bytes: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time value of a host's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSnapshot {
    pub requests: u64,
    pub bytes: u64,
}

/// Point-in-time value of the global counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub requests: u64,
    pub bytes: u64,
}

/// Point-in-time value of the method counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodTotals {
    pub get: u64,
    pub post: u64,
    pub other: u64,
}

/// Shared request counters.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    totals: GlobalCounters,
    methods: MethodCounters,
    hosts: DashMap<String, Arc<HostStats>>,
    /// Maximum number of distinct hosts tracked; `None` is unbounded.
    host_limit: Option<usize>,
}

impl StatsRegistry {
    /// Create a registry that tracks every host it sees.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that tracks at most `limit` distinct hosts.
    ///
    /// Hosts first seen after the limit is reached are counted under
    /// [`OVERFLOW_HOST`]. A limit of zero disables the cap. The check is
    /// not atomic with the insert, so concurrent first sightings may
    /// overshoot the limit by a few entries.
    pub fn with_host_limit(limit: usize) -> Self {
        Self {
            host_limit: (limit > 0).then_some(limit),
            ..Self::default()
        }
    }

    /// Fold a classified request into the counters.
    pub fn record(&self, request: &Classified) {
        self.record_request(&request.host_key, request.method, request.size_estimate);
    }

    /// Count one request for `host_key` of `size_estimate` bytes.
    pub fn record_request(&self, host_key: &str, method: MethodCategory, size_estimate: u64) {
        self.totals.requests.fetch_add(1, Ordering::Relaxed);
        self.totals.bytes.fetch_add(size_estimate, Ordering::Relaxed);

        let counter = match method {
            MethodCategory::Get => &self.methods.get,
            MethodCategory::Post => &self.methods.post,
            MethodCategory::Other => &self.methods.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.load_or_create_host(host_key).record(size_estimate);
    }

    /// Return the counters for `host_key`, inserting a zeroed entry on first sight.
    ///
    /// Concurrent first-time callers for the same key all receive the single
    /// stored instance.
    pub fn load_or_create_host(&self, host_key: &str) -> Arc<HostStats> {
        if let Some(existing) = self.hosts.get(host_key) {
            return Arc::clone(existing.value());
        }

        let key = match self.host_limit {
            Some(limit) if self.hosts.len() >= limit => {
                if let Some(overflow) = self.hosts.get(OVERFLOW_HOST) {
                    return Arc::clone(overflow.value());
                }
                OVERFLOW_HOST
            }
            _ => host_key,
        };

        let entry = self
            .hosts
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(HostStats::default()));
        Arc::clone(entry.value())
    }

    pub fn snapshot_totals(&self) -> Totals {
        Totals {
            requests: self.totals.requests.load(Ordering::Relaxed),
            bytes: self.totals.bytes.load(Ordering::Relaxed),
        }
    }

    pub fn snapshot_methods(&self) -> MethodTotals {
        MethodTotals {
            get: self.methods.get.load(Ordering::Relaxed),
            post: self.methods.post.load(Ordering::Relaxed),
            other: self.methods.other.load(Ordering::Relaxed),
        }
    }

    /// Current value of every tracked host, in no particular order.
    pub fn snapshot_hosts(&self) -> Vec<(String, HostSnapshot)> {
        self.hosts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    /// Number of distinct hosts tracked.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }
}
