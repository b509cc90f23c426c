//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_total` (counter): requests by outcome
//! - `gatekeeper_request_duration_seconds` (histogram): latency by outcome
//! - `gatekeeper_rate_limited_total` (counter): rejections by identifier kind
//! - `gatekeeper_challenge_total` (counter): verifications by result
//! - `gatekeeper_backend_responses_total` (counter): relayed backend statuses
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("gatekeeper_requests_total", "outcome" => outcome).increment(1);
    histogram!("gatekeeper_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(kind: &'static str) {
    counter!("gatekeeper_rate_limited_total", "kind" => kind).increment(1);
}

pub fn record_challenge(passed: bool) {
    let result = if passed { "passed" } else { "failed" };
    counter!("gatekeeper_challenge_total", "result" => result).increment(1);
}

pub fn record_backend_status(status: u16) {
    counter!("gatekeeper_backend_responses_total", "status" => status.to_string()).increment(1);
}
