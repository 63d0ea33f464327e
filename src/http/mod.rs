//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → handlers.rs (run monitor, choose HTTP status)
//!     → JSON response
//! ```
//!
//! # Routes
//! - `GET /health` aggregate report, 503 if any service is unhealthy
//! - `GET /health/services/{service}` single service
//! - `GET /health/breakers` breaker snapshot
//! - `GET /live` process liveness

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
