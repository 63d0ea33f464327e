//! External service health monitor.
//!
//! Runs registered probes through the circuit breaker and the probe
//! deadline, grades latency by the service's policy and returns typed
//! results. No probe failure escapes as an error.

use arc_swap::ArcSwap;
use futures_util::future::{join_all, FutureExt};
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::{CircuitBreakerConfig, MonitorConfig};
use crate::health::clock::{Clock, SystemClock};
use crate::health::policy::ServicePolicy;
use crate::health::result::{HealthError, HealthResult, HealthStatus};
use crate::observability::metrics;
use crate::probes::Probe;
use crate::resilience::circuit_breaker::{Admission, CircuitBreakerRegistry, CircuitBreakerState};
use crate::resilience::timeouts::with_deadline;

/// Tunables that may change at runtime without losing breaker state.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub probe_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
    pub policies: HashMap<String, ServicePolicy>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl MonitorSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            probe_timeout: Duration::from_millis(config.probes.timeout_ms),
            breaker: config.circuit_breaker,
            policies: config
                .services
                .iter()
                .map(|(name, policy)| (name.to_string(), *policy))
                .collect(),
        }
    }

    /// Policy for `service`, falling back to the default critical policy.
    pub fn policy(&self, service: &str) -> ServicePolicy {
        self.policies.get(service).copied().unwrap_or_default()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("unknown service '{0}'")]
    UnknownService(String),
}

/// Owns the probes and their breaker state.
pub struct HealthMonitor {
    probes: Vec<Arc<dyn Probe>>,
    breakers: CircuitBreakerRegistry,
    settings: ArcSwap<MonitorSettings>,
    clock: Arc<dyn Clock>,
}

impl HealthMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: MonitorSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            probes: Vec::new(),
            breakers: CircuitBreakerRegistry::new(),
            settings: ArcSwap::from_pointee(settings),
            clock,
        }
    }

    /// Add a probe. Aggregate results follow registration order.
    pub fn register(&mut self, probe: Arc<dyn Probe>) -> &mut Self {
        tracing::debug!(service = %probe.service(), "Registered probe");
        self.probes.push(probe);
        self
    }

    /// Registered service names in registration order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(|p| p.service())
    }

    /// Swap settings in place. Breaker records are kept.
    pub fn reconfigure(&self, settings: MonitorSettings) {
        tracing::info!(
            probe_timeout_ms = settings.probe_timeout.as_millis() as u64,
            failure_threshold = settings.breaker.failure_threshold,
            recovery_window_ms = settings.breaker.recovery_window_ms,
            "Monitor settings updated"
        );
        self.settings.store(Arc::new(settings));
    }

    pub fn settings(&self) -> Arc<MonitorSettings> {
        self.settings.load_full()
    }

    /// Read-only copy of every breaker record.
    pub fn breaker_snapshot(&self) -> BTreeMap<String, CircuitBreakerState> {
        self.breakers.snapshot()
    }

    /// Probe a single service by name.
    pub async fn check_service(&self, service: &str) -> Result<HealthResult, MonitorError> {
        let probe = self
            .probes
            .iter()
            .find(|p| p.service() == service)
            .ok_or_else(|| MonitorError::UnknownService(service.to_string()))?;
        Ok(self.run_isolated(probe.as_ref()).await)
    }

    /// Probe every registered service concurrently.
    ///
    /// Always returns one result per registered probe, in registration
    /// order. A probe invocation that cannot produce an outcome at all
    /// (in Rust, a panic inside `check`) yields a synthesized unhealthy
    /// result instead of failing the whole report.
    pub async fn check_all_services(&self) -> Vec<HealthResult> {
        join_all(self.probes.iter().map(|probe| self.run_isolated(probe.as_ref()))).await
    }

    /// Run one probe, converting a panic into a `ProbeAborted` result.
    async fn run_isolated(&self, probe: &dyn Probe) -> HealthResult {
        match AssertUnwindSafe(self.run_probe(probe)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(service = %probe.service(), error = %message, "Probe aborted");
                metrics::record_probe(probe.service(), HealthStatus::Unhealthy, 0);
                HealthResult::aborted(probe.service(), message, self.clock.now_ms())
            }
        }
    }

    async fn run_probe(&self, probe: &dyn Probe) -> HealthResult {
        let service = probe.service();
        let settings = self.settings.load_full();

        let missing = probe.missing_configuration();
        if !missing.is_empty() {
            tracing::debug!(service = %service, missing = ?missing, "Dependency not configured, skipping probe");
            metrics::record_probe(service, HealthStatus::NotConfigured, 0);
            return HealthResult::not_configured(service, missing, self.clock.now_ms());
        }

        let now = self.clock.now_ms();
        if let Admission::Rejected { next_attempt_at } = self.breakers.admit(service, now) {
            tracing::debug!(service = %service, next_attempt_at, "Circuit breaker open, short-circuiting probe");
            metrics::record_breaker_rejection(service);
            metrics::record_probe(service, HealthStatus::Unhealthy, 0);
            return HealthResult::breaker_open(service, next_attempt_at, now);
        }

        let policy = settings.policy(service);
        let started = Instant::now();
        let outcome = with_deadline(settings.probe_timeout, probe.check()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(detail)) => {
                self.breakers.record_success(service);
                HealthResult::new(service, policy.classify(elapsed_ms), elapsed_ms, self.clock.now_ms())
                    .with_detail(detail)
            }
            Ok(Err(e)) => {
                let error = HealthError::Dependency { message: e.to_string() };
                self.failed(service, &policy, &settings.breaker, elapsed_ms, error)
            }
            Err(elapsed) => {
                let error = HealthError::Timeout { after_ms: elapsed.after_ms };
                self.failed(service, &policy, &settings.breaker, elapsed_ms, error)
            }
        };

        metrics::record_probe(service, result.status, result.response_time_ms);
        metrics::record_breaker_state(service, self.breakers.state(service).is_some_and(|s| s.is_open));
        tracing::debug!(
            service = %service,
            status = %result.status,
            response_time_ms = result.response_time_ms,
            "Probe finished"
        );
        result
    }

    fn failed(
        &self,
        service: &str,
        policy: &ServicePolicy,
        breaker: &CircuitBreakerConfig,
        elapsed_ms: u64,
        error: HealthError,
    ) -> HealthResult {
        let now = self.clock.now_ms();
        tracing::warn!(service = %service, error = %error, "Probe failed");
        if error.is_breaker_failure() {
            self.breakers.record_failure(service, now, breaker);
        }
        HealthResult::new(service, policy.failure_status(), elapsed_ms, now).with_error(error)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "probe panicked".to_string()
    }
}
