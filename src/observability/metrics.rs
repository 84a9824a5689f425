//! Metrics collection and exposition.
//!
//! # Metrics
//! - `htmx_requests_total` (counter): requests by method, status, viewer
//! - `htmx_request_duration_seconds` (histogram): dispatch latency
//! - `htmx_template_builds_total` (counter): template set builds by host scope
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Host labels only carry known tenant scopes, never raw `Host` headers

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, viewer: &'static str, start: Instant) {
    counter!(
        "htmx_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "viewer" => viewer
    )
    .increment(1);
    histogram!("htmx_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one template set build.
pub fn record_template_build(scope: &str) {
    let host = if scope.is_empty() { "default" } else { scope };
    counter!("htmx_template_builds_total", "host" => host.to_string()).increment(1);
}
