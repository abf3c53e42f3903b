/// Resilience patterns for Nova chat services
///
/// Currently provides a single building block:
/// - **Retry**: fixed-interval or exponential backoff, bounded or unbounded attempts,
///   with an optional per-attempt timeout
///
/// # Example: wait for a dependency forever
///
/// ```rust,no_run
/// use resilience::{with_retry, RetryConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let policy = RetryConfig::fixed_forever(Duration::from_secs(2));
///
///     let result = with_retry(&policy, || async {
///         // Your liveness probe here
///         Ok::<_, String>(())
///     })
///     .await;
///     assert!(result.is_ok());
/// }
/// ```

pub mod retry;

pub use retry::{with_retry, AttemptError, RetryConfig, RetryError};
