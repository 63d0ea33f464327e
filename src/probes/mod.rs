//! Dependency probes.
//!
//! # Data Flow
//! ```text
//! HealthMonitor
//!     → Probe::missing_configuration (skip when unconfigured)
//!     → Probe::check (a few read/write calls against one dependency)
//!     → Ok(detail) | Err(ProbeError)
//! ```
//!
//! # Design Decisions
//! - Probes know nothing about breakers, deadlines or latency tiers
//! - Probe errors are decoded into `HealthError` by the monitor
//! - Clients are created lazily so an unreachable dependency never blocks startup

pub mod cache;
pub mod database;
pub mod email;
pub mod paypal;
pub mod stripe;

use async_trait::async_trait;
use thiserror::Error;

pub use cache::RedisProbe;
pub use database::DatabaseProbe;
pub use email::SmtpProbe;
pub use paypal::PaypalProbe;
pub use stripe::StripeProbe;

/// Failure raised by a probe while talking to its dependency.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A health check against one external dependency.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable service name used as the breaker key.
    fn service(&self) -> &str;

    /// Environment keys that must be set before the probe can run.
    /// Empty when the dependency is configured.
    fn missing_configuration(&self) -> Vec<String>;

    /// Exercise the dependency. Returns optional diagnostic detail.
    async fn check(&self) -> Result<Option<serde_json::Value>, ProbeError>;
}

/// Truncate an error body so it stays readable in a health payload.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Convert a non-success response into a `ProbeError`.
pub(crate) async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ProbeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProbeError::Status {
        status: status.as_u16(),
        body: excerpt(&body),
    })
}
