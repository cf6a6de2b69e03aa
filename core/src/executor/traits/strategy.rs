use std::time::Duration;

/// Backoff policy for retrying transient agent failures.
///
/// The engine decides *whether* an error is retryable (only RateLimited and
/// Transient are); the strategy decides how many attempts to allow and how
/// long to wait between them. `attempt` is 1-based: the delay before the
/// second attempt is `next_delay(1)`.
pub trait RetryStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn max_attempts(&self) -> u32;
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}
