//! Startup orchestration.
//!
//! Builds the monitor from validated configuration and environment
//! credentials. Probes are registered in a fixed order which is also the
//! order of aggregate results.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Credentials, MonitorConfig, PaypalMode};
use crate::health::{HealthMonitor, MonitorSettings};
use crate::probes::{DatabaseProbe, PaypalProbe, RedisProbe, SmtpProbe, StripeProbe};

/// Build the HTTP client shared by the payment probes.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("health-monitor/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .build()
}

/// Wire every dependency probe into a fresh monitor.
pub fn build_monitor(
    config: &MonitorConfig,
    credentials: &Credentials,
    client: reqwest::Client,
) -> HealthMonitor {
    let endpoints = &config.endpoints;
    let paypal_base = match credentials.paypal_mode {
        PaypalMode::Sandbox => endpoints.paypal_sandbox_base.clone(),
        PaypalMode::Live => endpoints.paypal_live_base.clone(),
    };

    let mut monitor = HealthMonitor::new(MonitorSettings::from_config(config));
    monitor
        .register(Arc::new(DatabaseProbe::new(credentials.database_url.clone())))
        .register(Arc::new(RedisProbe::new(credentials.redis_url.clone())))
        .register(Arc::new(StripeProbe::new(
            client.clone(),
            endpoints.stripe_api_base.clone(),
            credentials.stripe_secret_key.clone(),
        )))
        .register(Arc::new(PaypalProbe::new(
            client,
            paypal_base,
            credentials.paypal_mode,
            credentials.paypal_client_id.clone(),
            credentials.paypal_client_secret.clone(),
        )))
        .register(Arc::new(SmtpProbe::new(
            credentials.smtp_host.clone(),
            credentials.smtp_port,
            endpoints.smtp_helo_name.clone(),
        )));

    tracing::info!(
        services = ?monitor.services().collect::<Vec<_>>(),
        credentials = ?credentials,
        "Health monitor initialized"
    );
    monitor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;

    #[tokio::test]
    async fn test_registration_order_and_unconfigured() {
        let monitor = build_monitor(
            &MonitorConfig::default(),
            &Credentials::from_lookup(|_| None),
            http_client().unwrap(),
        );
        assert_eq!(
            monitor.services().collect::<Vec<_>>(),
            ["database", "redis", "stripe", "paypal", "email"]
        );

        let results = monitor.check_all_services().await;
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.status == HealthStatus::NotConfigured));
        assert!(results.iter().all(|r| r.response_time_ms == 0));
        assert!(monitor.breaker_snapshot().is_empty());
    }
}
