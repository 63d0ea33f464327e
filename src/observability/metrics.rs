//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_probe_total` (counter): probe results by service, status
//! - `health_probe_duration_seconds` (histogram): probe latency by service
//! - `health_circuit_breaker_open` (gauge): 1=open, 0=closed
//! - `health_circuit_breaker_rejections_total` (counter): short-circuited probes
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::health::HealthStatus;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_probe(service: &str, status: HealthStatus, latency_ms: u64) {
    counter!(
        "health_probe_total",
        "service" => service.to_string(),
        "status" => status.as_str()
    )
    .increment(1);

    if latency_ms > 0 {
        histogram!("health_probe_duration_seconds", "service" => service.to_string())
            .record(latency_ms as f64 / 1000.0);
    }
}

pub fn record_breaker_state(service: &str, open: bool) {
    gauge!("health_circuit_breaker_open", "service" => service.to_string())
        .set(if open { 1.0 } else { 0.0 });
}

pub fn record_breaker_rejection(service: &str) {
    counter!("health_circuit_breaker_rejections_total", "service" => service.to_string())
        .increment(1);
    record_breaker_state(service, true);
}
