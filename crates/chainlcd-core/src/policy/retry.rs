//! Fixed-delay retry budget.
//!
//! Endpoint rotation does the load shedding, so the pause between attempts
//! stays constant instead of growing.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause after a failed attempt when another one follows.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Stateless retry policy. Answers "wait how long before attempt N+1?".
#[derive(Debug, Clone)]
pub struct FixedDelayRetry {
    pub config: RetryConfig,
}

impl FixedDelayRetry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Same policy with a different attempt budget (at least one attempt).
    pub fn with_attempts(&self, max_attempts: u32) -> Self {
        Self::new(RetryConfig {
            max_attempts: max_attempts.max(1),
            delay: self.config.delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Delay after the `attempt`-th failure (1-based), or `None` when the
    /// budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            None
        } else {
            Some(self.config.delay)
        }
    }
}
