//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Bind server → Wire signals → Start serving
//!
//! Shutdown (shutdown.rs):
//!     trigger(deadline) → Stop accepting → Drain in-flight → Abort leftovers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger(grace period)
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown has a deadline: connections still open after it are aborted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
