//! Prometheus metrics for upload observability.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return the handle that renders it.
///
/// Returns `None` when a recorder is already installed in this process.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    }
}

/// Record the outcome of an upload request.
pub fn upload_finished(outcome: &str) {
    counter!("results_uploads_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record failure rows committed by one upload.
pub fn failures_stored(count: usize) {
    counter!("results_failures_stored_total").increment(count as u64);
}

/// Record upload processing time.
pub fn ingest_duration(duration_ms: u64) {
    histogram!("results_ingest_duration_ms").record(duration_ms as f64);
}

pub fn health_check(reachable: bool) {
    let status = if reachable { "reachable" } else { "unreachable" };
    counter!("results_health_checks_total", "status" => status).increment(1);
}
