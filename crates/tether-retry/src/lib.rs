#![allow(clippy::must_use_candidate)]

//! Retry loop shared by REST calls, PKCE exchanges and store connections
//!
//! An operation is called up to `max_retries + 1` times. Retry `r`
//! (zero-based) waits `base_delay * (r + 1)` first, and the wait races a
//! [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use tether_error::{Result, StructuredError};
use tokio_util::sync::CancellationToken;

/// Retry budget and backoff step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Backoff step; retry `r` waits `base_delay * (r + 1)`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Single attempt, no retries
    pub const fn once() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Total number of calls the policy allows
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    /// Three retries, one second apart and growing
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `op` until it succeeds, the budget is spent, or `cancel` fires
///
/// Returns the first success or the last error. Cancellation during a
/// backoff wait stops the loop and yields a `400` whose comment is the last
/// error's message.
///
/// # Errors
///
/// Returns the last error from `op` once `policy.max_attempts()` calls have
/// failed, or a bad-request error if cancelled while waiting
pub async fn retry<T, F, Fut>(policy: RetryPolicy, cancel: &CancellationToken, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_retries {
            tracing::debug!(attempts = attempt + 1, error = %err, "retry budget exhausted");
            return Err(err);
        }

        let delay = policy.delay_for(attempt);

        tracing::warn!(
            attempt = attempt + 1,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "operation failed, retrying"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(attempt = attempt + 1, "retry cancelled");
                return Err(StructuredError::bad_request(err.to_string()));
            }
            () = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}

/// Child of `parent` that is also cancelled once `after` has elapsed
///
/// The timer task is spawned on the current runtime and exits as soon as
/// either token fires.
pub fn deadline_token(parent: &CancellationToken, after: Duration) -> CancellationToken {
    let token = parent.child_token();
    let timer = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            () = timer.cancelled() => {}
            () = tokio::time::sleep(after) => {
                tracing::debug!(budget_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX), "deadline reached");
                timer.cancel();
            }
        }
    });

    token
}
