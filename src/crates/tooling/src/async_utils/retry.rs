//! Retry utilities for async operations.
//!
//! Configurable retry policies with exponential backoff and jitter for
//! transient failures in async operations.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Configuration for retrying failed operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: usize,

    /// Initial interval between retries in seconds.
    pub initial_interval: f64,

    /// Multiplier applied to the interval after each retry.
    pub backoff_factor: f64,

    /// Ceiling on the interval between retries in seconds.
    pub max_interval: f64,

    /// Whether to add random jitter to intervals.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a new retry policy with the given max attempts.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: 0.5,
            backoff_factor: 2.0,
            max_interval: 60.0,
            jitter: true,
        }
    }

    /// Set the initial interval between retries.
    pub fn with_initial_interval(mut self, seconds: f64) -> Self {
        self.initial_interval = seconds;
        self
    }

    /// Set the backoff factor.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the maximum interval between retries.
    pub fn with_max_interval(mut self, seconds: f64) -> Self {
        self.max_interval = seconds;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the retry following `attempt` (0-indexed).
    ///
    /// Exponential backoff `initial_interval * backoff_factor^attempt`,
    /// capped at `max_interval`, with optional jitter in the 0.5x–1.5x
    /// band.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        if attempt >= self.max_attempts {
            return Duration::from_secs(0);
        }

        let base = self.initial_interval * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_interval);

        let final_delay = if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..=1.5);
            capped * factor
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay)
    }

    /// Whether another attempt is allowed after `attempt` attempts.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Execute an async operation with retry on any error.
///
/// The operation must be safe to re-run; the last error is returned when
/// every attempt fails.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> std::result::Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(policy, |_| true, operation).await
}

/// Execute an async operation, retrying only errors the predicate accepts.
///
/// Non-retryable errors (the predicate returns `false`) are returned
/// immediately without consuming further attempts.
pub async fn with_retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    operation: F,
) -> std::result::Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if !is_retryable(&error) {
                    return Err(error);
                }

                tracing::debug!(attempt = attempt + 1, %error, "attempt failed");
                last_error = Some(error);

                if !policy.should_retry(attempt + 1) {
                    break;
                }

                let delay = policy.delay_for(attempt);
                tracing::debug!(?delay, "backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(last_error.expect("at least one attempt was made"))
}
