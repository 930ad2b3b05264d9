//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ocs_requests_total` (counter): dispatched requests by route, outcome
//! - `ocs_request_duration_seconds` (histogram): dispatch latency by route
//! - `ocs_auth_failures_total` (counter): rejected or failed credential checks
//! - `ocs_collaborator_failures_total` (counter): failed collaborator calls by operation
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Labels are low-cardinality: route names and fixed outcome strings

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
pub fn record_request(route: &'static str, outcome: &'static str, start: Instant) {
    counter!("ocs_requests_total", "route" => route, "outcome" => outcome).increment(1);
    histogram!("ocs_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_auth_failure() {
    counter!("ocs_auth_failures_total").increment(1);
}

pub fn record_collaborator_failure(operation: &'static str) {
    counter!("ocs_collaborator_failures_total", "operation" => operation).increment(1);
}
