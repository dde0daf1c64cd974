//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections
//!     → Stop reporter → Final stats report → Exit
//! ```
//!
//! # Design Decisions
//! - Bind failure at startup is fatal; nothing is retried
//! - Shutdown has timeout: exit proceeds after the grace period
//! - A failed drain is logged, never fatal

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
