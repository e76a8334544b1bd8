//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forms_submissions_total` (counter): submissions by form, outcome
//! - `forms_submission_duration_seconds` (histogram): end-to-end handler time
//! - `forms_rate_limited_total` (counter): rejected requests by form
//! - `forms_rpc_fallback_total` (counter): inserts that needed the
//!   privileged procedure, by table
//!
//! # Design Decisions
//! - The exporter is opt-in; recording against no exporter is a no-op, so
//!   call sites never check whether metrics are enabled

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Failure to bind is logged, not
/// fatal; the service is still useful without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install Prometheus exporter"),
    }
}

pub fn record_submission(form: &'static str, outcome: &'static str, started: Instant) {
    counter!("forms_submissions_total", "form" => form, "outcome" => outcome).increment(1);
    histogram!("forms_submission_duration_seconds", "form" => form)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_rate_limited(form: &'static str) {
    counter!("forms_rate_limited_total", "form" => form).increment(1);
}

pub fn record_rpc_fallback(table: &'static str) {
    counter!("forms_rpc_fallback_total", "table" => table).increment(1);
}
