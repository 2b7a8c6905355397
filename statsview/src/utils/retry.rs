//! Async retry utilities with exponential backoff

use std::time::Duration;

use crate::core::HttpConfig;
use crate::core::constants::MAX_RETRY_DELAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// Only errors for which `is_transient` returns true are retried. Returns the
/// value of the first success, or the last error.
pub async fn retry_async<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_transient: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= policy.max_attempts || !is_transient(&e) {
                    return Err(e);
                }
                let delay = backoff_delay(policy, attempts);
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay after the `attempt`-th failure: `base * 2^(attempt - 1)`, capped
fn backoff_delay(policy: RetryPolicy, attempt: u32) -> Duration {
    let factor = 1_u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    let millis = policy
        .base_delay_ms
        .saturating_mul(factor)
        .min(MAX_RETRY_DELAY_MS);
    Duration::from_millis(millis)
}
