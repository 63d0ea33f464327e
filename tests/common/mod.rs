//! Shared utilities for integration tests.

use async_trait::async_trait;
use health_monitor::health::{Clock, HealthMonitor, MonitorSettings};
use health_monitor::probes::{Probe, ProbeError};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted probe does on its next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
    Sleep(Duration),
}

/// A probe whose behavior can be changed between calls.
pub struct ScriptedProbe {
    name: &'static str,
    behavior: Mutex<Behavior>,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedProbe {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior: Mutex::new(behavior),
            calls: AtomicU32::new(0),
        })
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn service(&self) -> &str {
        self.name
    }

    fn missing_configuration(&self) -> Vec<String> {
        Vec::new()
    }

    async fn check(&self) -> Result<Option<serde_json::Value>, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            Behavior::Succeed => Ok(Some(json!({ "call": call }))),
            Behavior::Fail => Err(ProbeError::Protocol(format!("{} refused connection", self.name))),
            Behavior::Panic => panic!("{} probe harness exploded", self.name),
            Behavior::Sleep(delay) => {
                tokio::time::sleep(delay).await;
                Ok(None)
            }
        }
    }
}

/// Build a monitor over the given probes with default settings.
#[allow(dead_code)]
pub fn monitor_with(probes: &[Arc<ScriptedProbe>], clock: Arc<dyn Clock>) -> HealthMonitor {
    let mut monitor = HealthMonitor::with_clock(MonitorSettings::default(), clock);
    for probe in probes {
        monitor.register(probe.clone());
    }
    monitor
}
