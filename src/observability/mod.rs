//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway plugins produce:
//!     → middleware.rs (one start line per trigger, optional completion line)
//!     → metrics.rs (trigger counters, latency histogram)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows from the gateway layer stack into every log line
//! - Metrics are cheap (atomic increments) and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
pub mod middleware;

pub use middleware::{LoggingLayer, LoggingService};
