//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe request:
//!     → circuit_breaker.rs (admit or short-circuit)
//!     → timeouts.rs (enforce probe deadline)
//!     → circuit_breaker.rs (record success / failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe has a deadline
//! - Breakers are per service, never global
//! - Recovery is checked on demand, no background timers

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{Admission, CircuitBreakerRegistry, CircuitBreakerState};
pub use timeouts::{with_deadline, DeadlineElapsed};
