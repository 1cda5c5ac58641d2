//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): completed requests by method, status
//! - `http_request_duration_seconds` (histogram): latency by method
//! - `http_failures_total` (counter): failures by taxonomy code
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed
//! - The Prometheus listener is opt-in

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, started_at: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(started_at.elapsed().as_secs_f64());
}

/// Record one failure leaving the error pipeline.
pub fn record_failure(code: &'static str) {
    metrics::counter!("http_failures_total", "code" => code).increment(1);
}
