//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! caller (HTTP route, CLI)
//!     → monitor.rs (aggregate or single service)
//!     → per service: breaker gate → probe under deadline
//!     → policy.rs (latency tier, criticality cap)
//!     → result.rs (HealthResult handed back, never stored)
//! ```
//!
//! # Design Decisions
//! - The monitor is constructed explicitly and injected; there is no global
//! - Health state is per service, not per pool
//! - The monitor reports; callers decide what an unhealthy result means

pub mod clock;
pub mod monitor;
pub mod policy;
pub mod result;

pub use clock::{Clock, ManualClock, SystemClock};
pub use monitor::{HealthMonitor, MonitorError, MonitorSettings};
pub use policy::{Criticality, ServicePolicy};
pub use result::{HealthError, HealthResult, HealthStatus};
