//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fileserver_requests_total` (counter): completed requests by method, status
//! - `fileserver_request_duration_seconds` (histogram): handling latency by method
//! - `fileserver_connections_accepted_total` (counter): accepted connections
//! - `fileserver_queue_depth` (gauge): connections waiting for a worker
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "fileserver_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "fileserver_request_duration_seconds",
        "method" => method.to_owned()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_accept() {
    metrics::counter!("fileserver_connections_accepted_total").increment(1);
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("fileserver_queue_depth").set(depth as f64);
}
