//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding operations and lifecycle events produce:
//!     → logging.rs (structured tracing events, one span per forward)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Each forwarding operation gets a request ID on its span, not on the wire
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;
