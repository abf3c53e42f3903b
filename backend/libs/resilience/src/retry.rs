/// Retry policy with fixed or exponential backoff
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (`None` retries forever)
    pub max_retries: Option<u32>,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier (1.0 gives a fixed interval)
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
    /// Upper bound for a single attempt
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(3),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
            attempt_timeout: None,
        }
    }
}

impl RetryConfig {
    /// Same delay between every attempt, never gives up.
    pub fn fixed_forever(interval: Duration) -> Self {
        Self {
            max_retries: None,
            initial_backoff: interval,
            max_backoff: interval,
            backoff_multiplier: 1.0,
            jitter: false,
            attempt_timeout: None,
        }
    }

    /// Same delay between attempts, gives up after `max_retries` retries.
    pub fn fixed(interval: Duration, max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
            ..Self::fixed_forever(interval)
        }
    }

    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        let next = current.as_millis() as f64 * self.backoff_multiplier;
        Duration::from_millis(next.min(self.max_backoff.as_millis() as f64) as u64)
    }
}

/// Why a single attempt failed
#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    #[error("{0}")]
    Failed(E),
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Max retries ({retries}) exceeded: {last}")]
    MaxRetriesExceeded { retries: u32, last: AttemptError<E> },
}

/// Execute a future with retry logic
///
/// Every failed attempt is logged at `warn` with its error before sleeping.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut f: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;
    let mut backoff = config.initial_backoff;

    loop {
        let outcome = match config.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, f()).await {
                Ok(result) => result.map_err(AttemptError::Failed),
                Err(_) => Err(AttemptError::TimedOut(limit)),
            },
            None => f().await.map_err(AttemptError::Failed),
        };

        match outcome {
            Ok(result) => {
                if attempt > 0 {
                    info!(attempts = attempt + 1, "operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(err) => {
                attempt = attempt.saturating_add(1);

                if let Some(max_retries) = config.max_retries {
                    if attempt > max_retries {
                        warn!(error = %err, "Max retries ({}) reached", max_retries);
                        return Err(RetryError::MaxRetriesExceeded {
                            retries: max_retries,
                            last: err,
                        });
                    }
                }

                let delay = calculate_backoff(backoff, config.jitter);
                warn!(
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying"
                );

                tokio::time::sleep(delay).await;
                backoff = config.next_backoff(backoff);
            }
        }
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let jitter_factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3); // ±30%
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let config = RetryConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&config, move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let config = RetryConfig::fixed(Duration::from_millis(5), 3);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&config, move || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err("temporary error")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_max_retries_exceeded() {
        let config = RetryConfig::fixed(Duration::from_millis(5), 2);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&config, move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>("persistent error") }
        })
        .await;

        match result {
            Err(RetryError::MaxRetriesExceeded { retries, last }) => {
                assert_eq!(retries, 2);
                assert_eq!(last.to_string(), "persistent error");
            }
            Ok(_) => panic!("expected retries to be exhausted"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3); // Initial + 2 retries
    }

    #[tokio::test]
    async fn test_fixed_forever_keeps_trying_until_success() {
        let config = RetryConfig::fixed_forever(Duration::from_millis(2));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&config, move || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 20 {
                    Err("store not ready")
                } else {
                    Ok("PONG")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "PONG");
        assert_eq!(counter.load(Ordering::SeqCst), 21);
    }

    #[tokio::test]
    async fn test_fixed_interval_does_not_grow() {
        let config = RetryConfig::fixed_forever(Duration::from_secs(2));
        let next = config.next_backoff(config.initial_backoff);
        assert_eq!(next, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_failure() {
        let config = RetryConfig::fixed(Duration::from_millis(1), 1)
            .with_attempt_timeout(Duration::from_millis(10));

        let result = with_retry(&config, || async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, String>(())
        })
        .await;

        assert!(matches!(
            result,
            Err(RetryError::MaxRetriesExceeded {
                last: AttemptError::TimedOut(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_exponential_backoff() {
        let config = RetryConfig {
            max_retries: Some(3),
            initial_backoff: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            jitter: false,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let _ = with_retry(&config, || async { Err::<i32, _>("error") }).await;

        // Expected: 10ms + 20ms + 40ms = 70ms minimum
        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[tokio::test]
    async fn test_unbounded_retry_parks_between_attempts() {
        let config = RetryConfig::fixed_forever(Duration::from_secs(60));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let mut retrying = tokio_test::task::spawn(with_retry(&config, move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("not ready") }
        }));

        // First attempt fails, then the future sleeps instead of spinning.
        tokio_test::assert_pending!(retrying.poll());
        tokio_test::assert_pending!(retrying.poll());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
