//! Policy engine: the rules the selector and dispatcher apply per attempt.
//!
//! ```text
//! pick: [FailureCooldown] → [SlidingWindowLimiter] → endpoint
//! send: record → [Transport] → classify → [FixedDelayRetry]
//! ```

pub mod cooldown;
pub mod rate_limiter;
pub mod retry;

pub use cooldown::{CooldownConfig, CooldownState, FailureCooldown};
pub use rate_limiter::{RateLimiterConfig, SlidingWindowLimiter};
pub use retry::{FixedDelayRetry, RetryConfig};
