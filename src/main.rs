//! External service health monitor.
//!
//! Serves health-check routes for the dependencies of the academy platform:
//! relational database, Redis cache, Stripe, PayPal and the SMTP relay.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /health ──▶ http::handlers ──▶ health::monitor ──┬──▶ breaker gate ──▶ probe (deadline) ──▶ dependency
//!                                                        │
//!                                                        └──▶ policy (latency tier) ──▶ HealthResult
//!
//!   config file ──▶ config::watcher ──▶ monitor.reconfigure
//!   environment ──▶ config::credentials ──▶ probes
//! ```
//!
//! Usage: `health-monitor [CONFIG_PATH]` (or `HEALTH_MONITOR_CONFIG`).

use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use health_monitor::config::watcher::ConfigWatcher;
use health_monitor::config::{load_config, Credentials, MonitorConfig};
use health_monitor::http::HttpServer;
use health_monitor::lifecycle::{signals, startup, Shutdown};
use health_monitor::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HEALTH_MONITOR_CONFIG").ok())
        .map(PathBuf::from);

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "health-monitor starting");
    tracing::info!(
        config_path = ?config_path,
        bind_address = %config.server.bind_address,
        probe_timeout_ms = config.probes.timeout_ms,
        failure_threshold = config.circuit_breaker.failure_threshold,
        recovery_window_ms = config.circuit_breaker.recovery_window_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let credentials = Credentials::from_env();
    let monitor = Arc::new(startup::build_monitor(&config, &credentials, startup::http_client()?));

    // Keep the watcher handle alive for the life of the server.
    let (config_updates, _watcher) = match &config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (rx, Some(watcher.run()?))
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config, monitor)
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
