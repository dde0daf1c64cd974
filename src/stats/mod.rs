//! Traffic statistics subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler
//!     → classify.rs (host key, method bucket, size estimate)
//!     → registry.rs (global, per-method and per-host atomic counters)
//!
//! Reporter task (reporter.rs):
//!     every interval → snapshot → delta against previous → log summary
//!     on shutdown → final cumulative summary
//! ```
//!
//! # Design Decisions
//! - Counters are lock-free atomics; the host map is sharded (DashMap)
//! - Hot path never blocks on the reporter
//! - Snapshots are not a consistent cut across hosts

pub mod classify;
pub mod registry;
pub mod reporter;

pub use classify::{classify, Classified, MethodCategory};
pub use registry::StatsRegistry;
pub use reporter::{FinalReport, IntervalReport, StatsReporter};
