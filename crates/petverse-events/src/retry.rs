//! Bounded retry with a fixed delay.
//!
//! [`retry`] runs a fallible async action, waits a fixed delay after each
//! failure, and gives up after `max_retries` additional attempts. The final
//! error is always returned to the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Run `action` until it succeeds or `max_retries` retries are spent.
///
/// The action is attempted at most `max_retries + 1` times. Between
/// attempts the task sleeps for `delay`.
pub async fn retry<T, E, F, Fut>(
    operation: &str,
    mut action: F,
    max_retries: u32,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;
    loop {
        match action().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation = operation, attempt = attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_retries => {
                attempt = attempt.saturating_add(1);
                warn!(
                    operation = operation,
                    attempt = attempt,
                    max_retries = max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    operation = operation,
                    attempts = attempt.saturating_add(1),
                    error = %e,
                    "operation failed after all retry attempts"
                );
                return Err(e);
            }
        }
    }
}

/// A stored retry policy handed to components that talk to external
/// collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryExecutor {
    max_retries: u32,
    delay: Duration,
}

impl RetryExecutor {
    /// Create a policy of `max_retries` extra attempts spaced by `delay`.
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Extra attempts after the first failure.
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait between attempts.
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` under this policy.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        retry(operation, action, self.max_retries, self.delay).await
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counting_action(
        calls: &Arc<AtomicU32>,
        succeed_on: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            std::future::ready(if n >= succeed_on {
                Ok(n)
            } else {
                Err(format!("failure {n}"))
            })
        }
    }

    #[tokio::test]
    async fn first_success_does_not_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry("op", counting_action(&calls, 1), 3, Duration::ZERO).await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry("op", counting_action(&calls, 3), 3, Duration::from_millis(1)).await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_after_exhausting_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry("op", counting_action(&calls, 100), 2, Duration::from_millis(1)).await;
        assert_eq!(result, Err(String::from("failure 3")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_means_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = RetryExecutor::none()
            .run("op", counting_action(&calls, 2))
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn waits_the_fixed_delay_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(2, Duration::from_millis(20));
        let started = tokio::time::Instant::now();
        let _ = executor.run("op", counting_action(&calls, 100)).await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
