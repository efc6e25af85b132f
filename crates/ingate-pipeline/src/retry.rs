use std::future::Future;
use std::time::Duration;

use ingate_core::DeliveryError;
use tracing::warn;

/// Exponential-backoff retry schedule for batch delivery.
///
/// Carries no state between `execute` calls; cheap to clone and safe to
/// share across workers.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt and is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before retry `attempt` (1-indexed): `base_delay * 2^(attempt-1)`,
    /// saturating instead of overflowing.
    fn delay(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(Duration::MAX)
    }

    /// Drive `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Retryable and unclassified failures back off and retry; a permanent
    /// failure is returned immediately without another attempt. The backoff
    /// sleep is a plain tokio sleep, so cancelling the enclosing future
    /// abandons it promptly.
    pub async fn execute<F, Fut>(&self, mut op: F) -> Result<(), DeliveryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), DeliveryError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    let delay = self.delay(attempt);
                    warn!(attempt, ?delay, error = %err, "delivery attempt failed; backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn retryable() -> DeliveryError {
        DeliveryError::retryable(anyhow::anyhow!("transient"))
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(retryable())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_on_persistent_retryable() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(retryable()) }
            })
            .await;

        assert!(matches!(result, Err(DeliveryError::Retryable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_short_circuits() {
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let calls = AtomicU32::new(0);

        let start = tokio::time::Instant::now();
        let result = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DeliveryError::permanent(anyhow::anyhow!("denied"))) }
            })
            .await;

        assert!(matches!(result, Err(DeliveryError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_never_sleeps() {
        let policy = RetryPolicy::new(1, Duration::from_secs(30));
        let start = tokio::time::Instant::now();

        let result = policy.execute(|| async { Err(retryable()) }).await;

        assert!(result.is_err());
        // With a paused clock, time only advances across sleeps.
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        let start = tokio::time::Instant::now();

        let _ = policy.execute(|| async { Err(retryable()) }).await;

        // 100ms + 200ms + 400ms across the three backoffs.
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_base_delay_retries_without_waiting() {
        let policy = RetryPolicy::new(4, Duration::ZERO);
        let start = tokio::time::Instant::now();

        let _ = policy.execute(|| async { Err(retryable()) }).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
