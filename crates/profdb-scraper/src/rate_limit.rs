//! Retry, backoff and politeness delays for browser interactions.
//!
//! [`RetryPolicy::run`] retries transient failures (navigation, interaction,
//! transport) with exponential backoff. [`retry_once_if_absent`] is the
//! single-shot variant for elements that may legitimately be missing: it
//! waits once and then accepts absence. [`polite_pause`] is the jittered
//! throttle inserted between page loads and load-more clicks.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Bounded retry with exponential backoff.
///
/// Backoff schedule with the default `base_delay` of 1 s:
///
/// | Failed attempt | Sleep before next attempt |
/// |----------------|---------------------------|
/// | 1              | 1 s × 2⁰ = 1 s            |
/// | 2              | 1 s × 2¹ = 2 s            |
/// | 3              | 1 s × 2² = 4 s            |
///
/// No sleep follows the final attempt: with `max_attempts = 3` the caller
/// waits 1 s + 2 s in total before the last error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the `attempt`-th failure (1-based): `base_delay × 2^(attempt-1)`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `operation` until it succeeds, fails with a non-retriable error,
    /// or `max_attempts` attempts have failed. The last error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error from the final attempt, or the first non-retriable
    /// error encountered.
    pub async fn run<T, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retriable() || attempt >= max_attempts {
                        if err.is_retriable() {
                            tracing::warn!(
                                operation = operation_name,
                                attempts = attempt,
                                error = %err,
                                "giving up after exhausting retry attempts"
                            );
                        }
                        return Err(err);
                    }
                    let delay = self.delay_after(attempt);
                    #[allow(clippy::cast_possible_truncation)]
                    let delay_ms = delay.as_millis() as u64;
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        delay_ms,
                        error = %err,
                        "transient failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Looks for something that may simply not be on the page.
///
/// If the first lookup finds nothing, waits `grace` once and looks again.
/// A second `None` is a valid terminal answer, not an error.
pub async fn retry_once_if_absent<T, F, Fut>(grace: Duration, mut lookup: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    if let Some(found) = lookup().await {
        return Some(found);
    }
    tokio::time::sleep(grace).await;
    lookup().await
}

/// `base` scaled by a random factor in `[0.75, 1.25)`.
#[must_use]
pub fn jittered(base: Duration) -> Duration {
    base.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
}

/// Sleeps for a jittered `base` delay between requests to the site.
pub async fn polite_pause(base: Duration) {
    if base.is_zero() {
        return;
    }
    tokio::time::sleep(jittered(base)).await;
}
