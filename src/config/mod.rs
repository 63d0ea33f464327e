//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!
//! environment
//!     → credentials.rs (dependency URLs and secrets)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → channel → HealthMonitor::reconfigure (breaker state survives)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Secrets come only from the environment, never from the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use credentials::{Credentials, PaypalMode};
pub use loader::{load_config, ConfigError};
pub use schema::{
    CircuitBreakerConfig, EndpointConfig, LogFormat, MonitorConfig, ObservabilityConfig,
    ProbeConfig, ServerConfig, ServicesConfig,
};
