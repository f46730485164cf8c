//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_saves_total` (counter): saves by outcome (persisted, cleared, failed)
//! - `config_restarts_requested_total` (counter): restart requests by cause
//! - `config_decode_errors_total` (counter): rejected form submissions by section
//! - `config_persisted_delta_entries` (gauge): size of the stored delta
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder it is a no-op
//! - Prometheus exporter only runs when enabled in settings

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_save(outcome: &'static str) {
    metrics::counter!("config_saves_total", "outcome" => outcome).increment(1);
}

pub fn record_restart_requested(cause: &'static str) {
    metrics::counter!("config_restarts_requested_total", "cause" => cause).increment(1);
}

pub fn record_decode_error(section: &str) {
    metrics::counter!("config_decode_errors_total", "section" => section.to_string()).increment(1);
}

pub fn record_persisted_entries(entries: usize) {
    metrics::gauge!("config_persisted_delta_entries").set(entries as f64);
}
