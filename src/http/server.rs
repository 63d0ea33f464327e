//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health-check handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Apply hot-reloaded configuration to the monitor
//! - Serve until the shutdown signal fires

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{MonitorConfig, ServerConfig};
use crate::health::{HealthMonitor, MonitorSettings};
use crate::http::handlers;
use crate::lifecycle::shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<HealthMonitor>,
}

/// HTTP front end for the health monitor.
pub struct HttpServer {
    router: Router,
    config: MonitorConfig,
    monitor: Arc<HealthMonitor>,
}

impl HttpServer {
    pub fn new(config: MonitorConfig, monitor: Arc<HealthMonitor>) -> Self {
        let state = AppState {
            monitor: monitor.clone(),
        };
        let router = Self::build_router(&config.server, state);
        Self {
            router,
            config,
            monitor,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::get_health))
            .route("/health/services/{service}", get(handlers::get_service))
            .route("/health/breakers", get(handlers::get_breakers))
            .route("/live", get(handlers::get_live))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    /// The configured router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<MonitorConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.server.request_timeout_secs,
            services = ?self.monitor.services().collect::<Vec<_>>(),
            "HTTP server starting"
        );

        let monitor = self.monitor.clone();
        let running = self.config.server.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                // The listener and middleware stack are fixed at startup.
                if new_config.server != running {
                    tracing::warn!(
                        bind_address = %new_config.server.bind_address,
                        request_timeout_secs = new_config.server.request_timeout_secs,
                        "Server settings changed, restart required to apply them"
                    );
                }
                monitor.reconfigure(MonitorSettings::from_config(&new_config));
            }
        });

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}
