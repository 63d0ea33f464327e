//! Timeout enforcement.
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from the operation's own errors
//! - The losing operation is dropped; nothing waits for it to settle

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The deadline passed before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timeout after {after_ms}ms")]
pub struct DeadlineElapsed {
    pub after_ms: u64,
}

/// Race `operation` against `deadline`.
pub async fn with_deadline<F>(deadline: Duration, operation: F) -> Result<F::Output, DeadlineElapsed>
where
    F: Future,
{
    tokio::time::timeout(deadline, operation)
        .await
        .map_err(|_| DeadlineElapsed {
            after_ms: deadline.as_millis() as u64,
        })
}
