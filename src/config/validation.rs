//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and addresses.
//! All problems are collected so an operator sees them in one pass.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("services.{service}: healthy_below_ms ({healthy}) exceeds degraded_below_ms ({degraded})")]
    InvertedThresholds {
        service: &'static str,
        healthy: u64,
        degraded: u64,
    },

    #[error("{field}: invalid socket address '{value}'")]
    BadAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    BadUrl { field: &'static str, value: String },

    #[error(
        "server.request_timeout_secs ({request_timeout_ms}ms) must exceed probes.timeout_ms ({probe_timeout_ms}ms)"
    )]
    RequestTimeoutTooShort {
        request_timeout_ms: u64,
        probe_timeout_ms: u64,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.probes.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "probes.timeout_ms" });
    }
    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::Zero { field: "circuit_breaker.failure_threshold" });
    }
    if config.circuit_breaker.recovery_window_ms == 0 {
        errors.push(ValidationError::Zero { field: "circuit_breaker.recovery_window_ms" });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "server.request_timeout_secs" });
    }

    // An aggregate report must finish before the HTTP layer gives up on it.
    let request_timeout_ms = config.server.request_timeout_secs.saturating_mul(1_000);
    if request_timeout_ms > 0
        && config.probes.timeout_ms > 0
        && request_timeout_ms <= config.probes.timeout_ms
    {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_timeout_ms,
            probe_timeout_ms: config.probes.timeout_ms,
        });
    }

    for (service, policy) in config.services.iter() {
        if policy.healthy_below_ms > policy.degraded_below_ms {
            errors.push(ValidationError::InvertedThresholds {
                service,
                healthy: policy.healthy_below_ms,
                degraded: policy.degraded_below_ms,
            });
        }
    }

    check_address(&mut errors, "server.bind_address", &config.server.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let endpoints = &config.endpoints;
    for (field, value) in [
        ("endpoints.stripe_api_base", &endpoints.stripe_api_base),
        ("endpoints.paypal_live_base", &endpoints.paypal_live_base),
        ("endpoints.paypal_sandbox_base", &endpoints.paypal_sandbox_base),
    ] {
        if url::Url::parse(value).is_err() {
            errors.push(ValidationError::BadUrl { field, value: value.clone() });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field,
            value: value.to_string(),
        });
    }
}
