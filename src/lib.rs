//! External service health monitor library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod probes;
pub mod resilience;

pub use config::schema::MonitorConfig;
pub use health::{HealthMonitor, HealthResult, HealthStatus};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
