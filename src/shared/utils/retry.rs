use std::time::Duration;

/// Backoff configuration for queued job retries.
///
/// Applied across queue re-claims, not inside a single HTTP call: a failed
/// attempt re-queues the job with `run_at = now + delay_for_attempt(n)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on the computed delay
    pub max_delay: Duration,
    /// Multiplier applied per retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    /// The queue contract: 3 attempts, 2s base, doubling.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before re-running a job that has already made `attempts` attempts.
    ///
    /// attempts=1 yields the base delay, attempts=2 doubles it, and so on.
    pub fn delay_for_attempt(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1);
        let multiplier = self.backoff_multiplier.powi(exponent as i32);
        let delay =
            Duration::from_millis((self.base_delay.as_millis() as f64 * multiplier) as u64);
        delay.min(self.max_delay)
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}
