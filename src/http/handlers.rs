//! Health-check route handlers.
//!
//! The monitor only reports. Mapping results to an HTTP status is decided
//! here: any unhealthy service makes the aggregate a 503.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::health::{HealthResult, HealthStatus, MonitorError};
use crate::http::server::AppState;
use crate::resilience::CircuitBreakerState;

#[derive(Debug, Serialize)]
pub struct AggregateReport {
    pub status: HealthStatus,
    pub services: Vec<HealthResult>,
}

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Worst status across results. `not_configured` does not count.
pub fn overall_status(results: &[HealthResult]) -> HealthStatus {
    let mut overall = HealthStatus::Healthy;
    for result in results {
        match result.status {
            HealthStatus::Unhealthy => return HealthStatus::Unhealthy,
            HealthStatus::Degraded => overall = HealthStatus::Degraded,
            HealthStatus::Healthy | HealthStatus::NotConfigured => {}
        }
    }
    overall
}

fn http_status(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    }
}

pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<AggregateReport>) {
    let services = state.monitor.check_all_services().await;
    let status = overall_status(&services);
    if status != HealthStatus::Healthy {
        tracing::warn!(status = %status, "Aggregate health check not healthy");
    }
    (http_status(status), Json(AggregateReport { status, services }))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Response {
    match state.monitor.check_service(&service).await {
        Ok(result) => (http_status(result.status), Json(result)).into_response(),
        Err(e @ MonitorError::UnknownService(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody { error: e.to_string() }),
        )
            .into_response(),
    }
}

pub async fn get_breakers(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, CircuitBreakerState>> {
    Json(state.monitor.breaker_snapshot())
}

pub async fn get_live() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
