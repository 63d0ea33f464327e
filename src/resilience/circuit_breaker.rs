//! Circuit breaker for dependency probes.
//!
//! # States
//! - Closed: probes run normally
//! - Open: probes are short-circuited without touching the dependency
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Closed: first admission at or after next_attempt_at
//! ```
//!
//! There is no separate half-open state and no timer. The open → closed
//! check runs lazily when the next probe asks for admission, so a breaker
//! that sees no traffic stays open in the snapshot.
//!
//! Each read-modify-write runs while holding the map entry's lock, so
//! concurrent probes of the same service never observe a torn record.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::CircuitBreakerConfig;

/// Failure bookkeeping for one service. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerState {
    pub is_open: bool,
    pub failure_count: u32,
    pub last_failure_at: Option<u64>,
    pub next_attempt_at: Option<u64>,
}

/// Decision returned by [`CircuitBreakerRegistry::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected { next_attempt_at: u64 },
}

/// Per-service breaker records, created lazily on first failure.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    states: DashMap<String, CircuitBreakerState>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a probe of `service` may run at `now`.
    pub fn admit(&self, service: &str, now: u64) -> Admission {
        let Some(mut state) = self.states.get_mut(service) else {
            return Admission::Allowed;
        };
        if !state.is_open {
            return Admission::Allowed;
        }

        match state.next_attempt_at {
            Some(next_attempt_at) if now < next_attempt_at => Admission::Rejected { next_attempt_at },
            _ => {
                state.is_open = false;
                state.failure_count = 0;
                state.next_attempt_at = None;
                tracing::info!(service = %service, "Circuit breaker recovery window elapsed, closing");
                Admission::Allowed
            }
        }
    }

    /// Record a successful probe.
    pub fn record_success(&self, service: &str) {
        if let Some(mut state) = self.states.get_mut(service) {
            if state.failure_count > 0 {
                tracing::debug!(service = %service, previous_failures = state.failure_count, "Resetting failure count");
            }
            state.failure_count = 0;
        }
    }

    /// Record a failed probe. Returns true if this failure opened the breaker.
    pub fn record_failure(&self, service: &str, now: u64, config: &CircuitBreakerConfig) -> bool {
        let mut state = self.states.entry(service.to_string()).or_default();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_at = Some(now);

        if state.is_open || state.failure_count < config.failure_threshold {
            return false;
        }

        let next_attempt_at = now.saturating_add(config.recovery_window_ms);
        state.is_open = true;
        state.next_attempt_at = Some(next_attempt_at);
        tracing::warn!(
            service = %service,
            failures = state.failure_count,
            next_attempt_at,
            "Circuit breaker opened"
        );
        true
    }

    /// Current record for one service, if any failure was ever recorded.
    pub fn state(&self, service: &str) -> Option<CircuitBreakerState> {
        self.states.get(service).map(|r| r.value().clone())
    }

    /// Owned copy of every record, ordered by service name.
    pub fn snapshot(&self) -> BTreeMap<String, CircuitBreakerState> {
        self.states
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}
