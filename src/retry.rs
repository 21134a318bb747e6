//! Bounded retry with exponential backoff for read-only, idempotent lookups.
//!
//! Never wrap the transfer write path in this: a transfer is not idempotent.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub const NONE: RetryPolicy = RetryPolicy {
        max_attempts: 1,
        base_backoff: Duration::ZERO,
    };

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_backoff: cfg.base_backoff(),
        }
    }
}

/// Only infrastructure failures are worth another attempt
fn is_transient(err: &LedgerError) -> bool {
    matches!(err, LedgerError::SystemError(_))
}

pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, op_name: &str, mut op: F) -> LedgerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LedgerResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if is_transient(&e) && attempt < policy.max_attempts => {
                let delay = policy.backoff_for(attempt);
                tracing::warn!(op = op_name, attempt, error = %e, ?delay, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
