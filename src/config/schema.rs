//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.
//! Secrets never live here; see `credentials.rs`.

use serde::{Deserialize, Serialize};

use crate::health::policy::ServicePolicy;

/// Root configuration for the health monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Probe execution settings.
    pub probes: ProbeConfig,

    /// Circuit breaker thresholds shared by all services.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Per-service latency policies.
    pub services: ServicesConfig,

    /// Public API endpoints of the probed providers.
    pub endpoints: EndpointConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound for a whole HTTP request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Probe execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Deadline for a single probe in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,

    /// How long an open breaker rejects probes, in milliseconds.
    pub recovery_window_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_window_ms: 60_000,
        }
    }
}

/// Latency policy for each probed service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    pub database: ServicePolicy,
    pub redis: ServicePolicy,
    pub stripe: ServicePolicy,
    pub paypal: ServicePolicy,
    pub email: ServicePolicy,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            database: ServicePolicy::critical(500, 1000),
            redis: ServicePolicy::best_effort(100, 500),
            stripe: ServicePolicy::critical(1000, 2000),
            paypal: ServicePolicy::critical(1500, 3000),
            email: ServicePolicy::critical(1000, 3000),
        }
    }
}

impl ServicesConfig {
    /// Iterate `(service name, policy)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ServicePolicy)> {
        [
            ("database", &self.database),
            ("redis", &self.redis),
            ("stripe", &self.stripe),
            ("paypal", &self.paypal),
            ("email", &self.email),
        ]
        .into_iter()
    }
}

/// Provider endpoints. Overridable for staging mirrors and tests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub stripe_api_base: String,
    pub paypal_live_base: String,
    pub paypal_sandbox_base: String,

    /// Name announced in the SMTP EHLO greeting.
    pub smtp_helo_name: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            stripe_api_base: "https://api.stripe.com".to_string(),
            paypal_live_base: "https://api-m.paypal.com".to_string(),
            paypal_sandbox_base: "https://api-m.sandbox.paypal.com".to_string(),
            smtp_helo_name: "health-monitor.local".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
