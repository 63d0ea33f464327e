//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! monitor, probes, HTTP layer produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (UUID v4) flows through HTTP spans
//! - Secrets are never logged; connection URLs are redacted

pub mod logging;
pub mod metrics;
