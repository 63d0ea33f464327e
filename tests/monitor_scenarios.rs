//! End-to-end monitor behavior across several services.

use health_monitor::health::{Clock, HealthError, HealthMonitor, HealthStatus, ManualClock, MonitorSettings};
use health_monitor::probes::StripeProbe;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{monitor_with, Behavior, ScriptedProbe};

#[tokio::test]
async fn test_aborting_probe_does_not_drop_results() {
    let probes = [
        ScriptedProbe::new("database", Behavior::Succeed),
        ScriptedProbe::new("redis", Behavior::Succeed),
        ScriptedProbe::new("stripe", Behavior::Panic),
        ScriptedProbe::new("paypal", Behavior::Succeed),
        ScriptedProbe::new("email", Behavior::Succeed),
    ];
    let monitor = monitor_with(&probes, Arc::new(ManualClock::new(42)));

    let results = monitor.check_all_services().await;
    assert_eq!(results.len(), 5);

    let names: Vec<_> = results.iter().map(|r| r.service.as_str()).collect();
    assert_eq!(names, ["database", "redis", "stripe", "paypal", "email"]);

    let aborted = &results[2];
    assert_eq!(aborted.status, HealthStatus::Unhealthy);
    assert_eq!(aborted.response_time_ms, 0);
    assert_eq!(
        aborted.error,
        Some(HealthError::ProbeAborted {
            message: "stripe probe harness exploded".into()
        })
    );

    for i in [0, 1, 3, 4] {
        assert_eq!(results[i].status, HealthStatus::Healthy, "{}", results[i].service);
        assert!(results[i].error.is_none());
    }
}

#[tokio::test]
async fn test_repeated_aggregation_is_stable() {
    let probes = [
        ScriptedProbe::new("database", Behavior::Succeed),
        ScriptedProbe::new("redis", Behavior::Succeed),
        ScriptedProbe::new("email", Behavior::Succeed),
    ];
    let clock = ManualClock::new(1_000);
    let monitor = monitor_with(&probes, Arc::new(clock.clone()));

    let first = monitor.check_all_services().await;
    clock.advance(Duration::from_secs(5));
    let second = monitor.check_all_services().await;

    let shape = |results: &[health_monitor::HealthResult]| {
        results
            .iter()
            .map(|r| (r.service.clone(), r.status))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first), shape(&second));
    assert_eq!(first[0].observed_at, 1_000);
    assert_eq!(second[0].observed_at, 6_000);
    assert!(monitor.breaker_snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_probes_run_concurrently() {
    let probes = [
        ScriptedProbe::new("database", Behavior::Sleep(Duration::from_millis(300))),
        ScriptedProbe::new("redis", Behavior::Sleep(Duration::from_millis(50))),
        ScriptedProbe::new("email", Behavior::Sleep(Duration::from_millis(300))),
    ];
    let monitor = monitor_with(&probes, Arc::new(ManualClock::new(0)));

    let started = tokio::time::Instant::now();
    let results = monitor.check_all_services().await;
    assert_eq!(started.elapsed(), Duration::from_millis(300));

    // Completion order differs from registration order; results do not.
    assert_eq!(results[1].service, "redis");
    assert_eq!(results[1].response_time_ms, 50);
    assert_eq!(results[0].response_time_ms, 300);
}

#[tokio::test]
async fn test_stripe_breaker_against_live_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/balance"))
        .respond_with(ResponseTemplate::new(500).set_body_string("api unavailable"))
        .mount(&server)
        .await;

    let clock = ManualClock::new(1_700_000_000_000);
    let mut monitor = HealthMonitor::with_clock(MonitorSettings::default(), Arc::new(clock.clone()));
    monitor.register(Arc::new(StripeProbe::new(
        reqwest::Client::new(),
        server.uri(),
        Some("sk_test_academy".into()),
    )));

    for _ in 0..5 {
        let result = monitor.check_service("stripe").await.unwrap();
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(
            result.error.unwrap().to_string(),
            "unexpected status 500: api unavailable"
        );
    }
    let failure_time = clock.now_ms();
    assert_eq!(
        monitor.breaker_snapshot()["stripe"].next_attempt_at,
        Some(failure_time + 60_000)
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 5);

    clock.set(failure_time + 1_000);
    let sixth = monitor.check_service("stripe").await.unwrap();
    assert_eq!(sixth.error.unwrap().to_string(), "Circuit breaker open");
    assert_eq!(server.received_requests().await.unwrap().len(), 5);

    clock.set(failure_time + 61_000);
    let seventh = monitor.check_service("stripe").await.unwrap();
    assert_eq!(seventh.status, HealthStatus::Unhealthy);
    assert_eq!(server.received_requests().await.unwrap().len(), 6);

    let state = &monitor.breaker_snapshot()["stripe"];
    assert!(!state.is_open);
    assert_eq!(state.failure_count, 1);
}
