//! Latency tiers and severity policy per dependency.

use serde::{Deserialize, Serialize};

use crate::health::result::HealthStatus;

/// How much an outage of the dependency matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Required dependency; slow or failing means unhealthy.
    #[default]
    Critical,
    /// Optional dependency; never reported worse than degraded.
    BestEffort,
}

impl Criticality {
    /// Clamp a status to the worst tier this class may report.
    pub fn cap(self, status: HealthStatus) -> HealthStatus {
        match (self, status) {
            (Criticality::BestEffort, HealthStatus::Unhealthy) => HealthStatus::Degraded,
            (_, status) => status,
        }
    }
}

/// Latency thresholds and criticality for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicePolicy {
    pub criticality: Criticality,

    /// Latencies strictly below this are healthy.
    pub healthy_below_ms: u64,

    /// Latencies strictly below this (and not healthy) are degraded.
    pub degraded_below_ms: u64,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self::critical(500, 1000)
    }
}

impl ServicePolicy {
    pub const fn critical(healthy_below_ms: u64, degraded_below_ms: u64) -> Self {
        Self {
            criticality: Criticality::Critical,
            healthy_below_ms,
            degraded_below_ms,
        }
    }

    pub const fn best_effort(healthy_below_ms: u64, degraded_below_ms: u64) -> Self {
        Self {
            criticality: Criticality::BestEffort,
            healthy_below_ms,
            degraded_below_ms,
        }
    }

    /// Map a measured latency to a status tier.
    pub fn classify(&self, latency_ms: u64) -> HealthStatus {
        let tier = if latency_ms < self.healthy_below_ms {
            HealthStatus::Healthy
        } else if latency_ms < self.degraded_below_ms {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };
        self.criticality.cap(tier)
    }

    /// Status reported when the probe errored or timed out.
    pub fn failure_status(&self) -> HealthStatus {
        self.criticality.cap(HealthStatus::Unhealthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tiers() {
        let policy = ServicePolicy::critical(500, 1000);
        assert_eq!(policy.classify(0), HealthStatus::Healthy);
        assert_eq!(policy.classify(499), HealthStatus::Healthy);
        assert_eq!(policy.classify(500), HealthStatus::Degraded);
        assert_eq!(policy.classify(999), HealthStatus::Degraded);
        assert_eq!(policy.classify(1000), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_slow_response_severity_by_class() {
        let critical = ServicePolicy::critical(500, 1000);
        let best_effort = ServicePolicy::best_effort(500, 1000);

        assert_eq!(critical.classify(1500), HealthStatus::Unhealthy);
        assert_eq!(best_effort.classify(1500), HealthStatus::Degraded);
        assert_eq!(best_effort.classify(100), HealthStatus::Healthy);
    }

    #[test]
    fn test_failure_status_by_class() {
        assert_eq!(ServicePolicy::critical(1, 2).failure_status(), HealthStatus::Unhealthy);
        assert_eq!(ServicePolicy::best_effort(1, 2).failure_status(), HealthStatus::Degraded);
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: ServicePolicy = toml::from_str(
            r#"
            criticality = "best_effort"
            healthy_below_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(policy.criticality, Criticality::BestEffort);
        assert_eq!(policy.healthy_below_ms, 100);
        assert_eq!(policy.degraded_below_ms, 1000);
    }
}
