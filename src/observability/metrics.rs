//! Metrics collection and exposition.
//!
//! # Metrics
//! - `membrane_triggers_total` (counter): handled triggers by source, status
//! - `membrane_trigger_duration_seconds` (histogram): handling latency by source
//! - `membrane_forward_failures_total` (counter): proxy failures by kind
//!
//! # Design Decisions
//! - The `metrics` facade is a no-op until [`init_metrics`] installs a recorder
//! - Labels stay low-cardinality: never paths or ids

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled trigger.
pub fn record_trigger(source: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "membrane_triggers_total",
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "membrane_trigger_duration_seconds",
        "source" => source.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record one failed forward call.
pub fn record_forward_failure(kind: &'static str) {
    metrics::counter!("membrane_forward_failures_total", "kind" => kind).increment(1);
}
