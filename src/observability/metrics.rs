//! Metrics collection and exposition.
//!
//! # Metrics
//! - `simona_sessions_total` (counter): accepted sessions
//! - `simona_sessions_active` (gauge): live sessions
//! - `simona_commands_total` (counter): commands by keyword (`OTHER` for unknown) and outcome
//! - `simona_malformed_lines_total` (counter): lines dropped by the parser
//! - `simona_gateway_requests_total` (counter): gateway calls by outcome
//! - `simona_gateway_request_duration_seconds` (histogram): gateway latency
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape endpoint.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_session_opened() {
    metrics::counter!("simona_sessions_total").increment(1);
    metrics::gauge!("simona_sessions_active").increment(1.0);
}

pub fn record_session_closed() {
    metrics::gauge!("simona_sessions_active").decrement(1.0);
}

pub fn record_command(command: &'static str, failed: bool) {
    let outcome = if failed { "fail" } else { "ok" };
    metrics::counter!(
        "simona_commands_total",
        "command" => command,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_malformed_lines(count: usize) {
    metrics::counter!("simona_malformed_lines_total").increment(count as u64);
}

pub fn record_gateway_request(outcome: &'static str, start: Instant) {
    metrics::counter!("simona_gateway_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("simona_gateway_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
