//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, idle/write deadlines)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Deadlines live on the socket wrapper, not in the handler

pub mod connection;
pub mod listener;

pub use connection::{ConnectionTracker, DeadlineStream};
pub use listener::{Listener, ListenerError};
