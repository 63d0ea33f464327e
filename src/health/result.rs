//! Probe outcome types.
//!
//! A `HealthResult` is built once per probe invocation and handed straight
//! to the caller. Nothing here is persisted.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Health tier reported for a single dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    NotConfigured,
}

impl HealthStatus {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::NotConfigured => "not_configured",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe did not produce a clean result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    /// The dependency did not answer before the probe deadline.
    #[error("timeout after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The dependency call itself failed.
    #[error("{message}")]
    Dependency { message: String },

    /// Credentials or endpoint missing from the environment.
    #[error("not configured: missing {}", missing.join(", "))]
    ConfigAbsent { missing: Vec<String> },

    /// The breaker refused to attempt the probe.
    #[error("Circuit breaker open")]
    BreakerOpen { next_attempt_at: u64 },

    /// The probe panicked instead of returning.
    #[error("probe aborted: {message}")]
    ProbeAborted { message: String },
}

impl HealthError {
    /// Short discriminant written as `kind` on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            HealthError::Timeout { .. } => "timeout",
            HealthError::Dependency { .. } => "dependency",
            HealthError::ConfigAbsent { .. } => "config_absent",
            HealthError::BreakerOpen { .. } => "breaker_open",
            HealthError::ProbeAborted { .. } => "probe_aborted",
        }
    }

    /// Whether this error counts against the service's breaker.
    pub fn is_breaker_failure(&self) -> bool {
        matches!(self, HealthError::Timeout { .. } | HealthError::Dependency { .. })
    }
}

impl Serialize for HealthError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.kind())?;
        map.serialize_entry("message", &self.to_string())?;
        match self {
            HealthError::Timeout { after_ms } => map.serialize_entry("afterMs", after_ms)?,
            HealthError::ConfigAbsent { missing } => map.serialize_entry("missing", missing)?,
            HealthError::BreakerOpen { next_attempt_at } => {
                map.serialize_entry("nextAttemptAt", next_attempt_at)?
            }
            HealthError::Dependency { .. } | HealthError::ProbeAborted { .. } => {}
        }
        map.end()
    }
}

/// Outcome of probing one external dependency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResult {
    /// Registered service name.
    pub service: String,
    pub status: HealthStatus,
    /// Measured latency; 0 when no probe ran.
    pub response_time_ms: u64,
    /// Epoch milliseconds at which the result was produced.
    pub observed_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<HealthError>,
}

impl HealthResult {
    pub fn new(
        service: impl Into<String>,
        status: HealthStatus,
        response_time_ms: u64,
        observed_at: u64,
    ) -> Self {
        Self {
            service: service.into(),
            status,
            response_time_ms,
            observed_at,
            detail: None,
            error: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<serde_json::Value>) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_error(mut self, error: HealthError) -> Self {
        self.error = Some(error);
        self
    }

    /// Result for a dependency with nothing configured.
    pub fn not_configured(service: impl Into<String>, missing: Vec<String>, observed_at: u64) -> Self {
        Self::new(service, HealthStatus::NotConfigured, 0, observed_at)
            .with_error(HealthError::ConfigAbsent { missing })
    }

    /// Result synthesized by an open breaker.
    pub fn breaker_open(service: impl Into<String>, next_attempt_at: u64, observed_at: u64) -> Self {
        Self::new(service, HealthStatus::Unhealthy, 0, observed_at)
            .with_error(HealthError::BreakerOpen { next_attempt_at })
    }

    /// Result synthesized when the probe itself blew up.
    pub fn aborted(service: impl Into<String>, message: impl Into<String>, observed_at: u64) -> Self {
        Self::new(service, HealthStatus::Unhealthy, 0, observed_at)
            .with_error(HealthError::ProbeAborted { message: message.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_wire_shape() {
        let result = HealthResult::new("stripe", HealthStatus::Degraded, 742, 1_700_000_000_000)
            .with_detail(Some(json!({ "livemode": false })));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["service"], "stripe");
        assert_eq!(value["status"], "degraded");
        assert_eq!(value["responseTimeMs"], 742);
        assert_eq!(value["observedAt"], 1_700_000_000_000u64);
        assert_eq!(value["detail"]["livemode"], false);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_breaker_open_result() {
        let result = HealthResult::breaker_open("stripe", 61_000, 1_000);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.response_time_ms, 0);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["error"]["kind"], "breaker_open");
        assert_eq!(value["error"]["message"], "Circuit breaker open");
        assert_eq!(value["error"]["nextAttemptAt"], 61_000);
    }

    #[test]
    fn test_not_configured_result() {
        let result = HealthResult::not_configured("paypal", vec!["PAYPAL_CLIENT_ID".into()], 5);
        assert_eq!(result.status, HealthStatus::NotConfigured);
        assert_eq!(result.response_time_ms, 0);
        assert_eq!(
            result.error.as_ref().map(ToString::to_string).as_deref(),
            Some("not configured: missing PAYPAL_CLIENT_ID")
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "not_configured");
        assert_eq!(value["error"]["missing"][0], "PAYPAL_CLIENT_ID");
    }

    #[test]
    fn test_breaker_failure_kinds() {
        assert!(HealthError::Timeout { after_ms: 10 }.is_breaker_failure());
        assert!(HealthError::Dependency { message: "refused".into() }.is_breaker_failure());
        assert!(!HealthError::BreakerOpen { next_attempt_at: 0 }.is_breaker_failure());
        assert!(!HealthError::ConfigAbsent { missing: vec![] }.is_breaker_failure());
    }
}
