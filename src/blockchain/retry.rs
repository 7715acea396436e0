//! Bounded retry for read-only contract calls.
//!
//! A read issued right after a locally-observed write can hit a node whose
//! index lags the write and come back transient-faulted or with a
//! not-yet-materialized value. This is a client-side workaround, not a
//! ledger guarantee: retry a few times with a fixed delay, then propagate
//! the last observation instead of silently returning a default.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::types::RelayError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Invoke `call` up to `policy.max_attempts` times, treating both a
/// transient fault and `is_incomplete(result) == true` as retryable.
///
/// On exhaustion the last observed fault is propagated; if the final
/// observation was an incomplete value, that surfaces as
/// `RelayError::InconsistentRead`.
pub async fn read_with_retry<T, F, Fut, P>(
    policy: RetryPolicy,
    mut call: F,
    is_incomplete: P,
) -> Result<T, RelayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RelayError>>,
    P: Fn(&T) -> bool,
{
    let mut last_error: Option<RelayError> = None;

    for attempt in 1..=policy.max_attempts {
        match call().await {
            Ok(value) if !is_incomplete(&value) => return Ok(value),
            Ok(_) => {
                warn!(
                    "Read attempt {}/{} returned an incomplete result",
                    attempt, policy.max_attempts
                );
                last_error = Some(RelayError::InconsistentRead(format!(
                    "incomplete result after {} attempts",
                    policy.max_attempts
                )));
            }
            Err(e) => {
                warn!(
                    "Read attempt {}/{} failed: {}",
                    attempt, policy.max_attempts, e
                );
                last_error = Some(e);
            }
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        RelayError::InconsistentRead("no attempts were made".to_string())
    }))
}
