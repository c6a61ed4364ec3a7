//! Sliding-window rate limiter, one window per endpoint address.
//!
//! Each address keeps the instants of its requests in the trailing
//! `window`. Stale instants are pruned lazily whenever the address is
//! inspected, so every instant left in a window is younger than `window`.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Length of the trailing window.
    pub window: Duration,
    /// Requests allowed per address inside the window.
    pub max_requests: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10),
            max_requests: 50,
        }
    }
}

/// Per-address request log.
///
/// Not internally synchronized: the owning dispatcher guards it together
/// with the selector so a pick and its request record happen in one step.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimiterConfig,
    windows: HashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Returns `true` if `address` has used up its budget for the window.
    pub fn is_limited(&mut self, address: &str, now: Instant) -> bool {
        self.usage(address, now) >= self.config.max_requests
    }

    /// Record a request sent to `address` at `now`.
    ///
    /// Called at send time, so failed and retried attempts consume budget.
    pub fn record(&mut self, address: &str, now: Instant) {
        self.windows
            .entry(address.to_string())
            .or_default()
            .push_back(now);
    }

    /// Requests counted against `address` in the current window.
    pub fn usage(&mut self, address: &str, now: Instant) -> usize {
        let Some(window) = self.windows.get_mut(address) else {
            return 0;
        };
        let span = self.config.window;
        while let Some(&oldest) = window.front() {
            if now.saturating_duration_since(oldest) >= span {
                window.pop_front();
            } else {
                break;
            }
        }
        window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: usize) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimiterConfig {
            window: Duration::from_secs(10),
            max_requests: max,
        })
    }

    #[test]
    fn within_budget() {
        let mut rl = limiter(3);
        let now = Instant::now();
        rl.record("a", now);
        rl.record("a", now);
        assert!(!rl.is_limited("a", now));
        assert_eq!(rl.usage("a", now), 2);
    }

    #[test]
    fn limited_at_budget() {
        let mut rl = limiter(3);
        let now = Instant::now();
        for _ in 0..3 {
            rl.record("a", now);
        }
        assert!(rl.is_limited("a", now));
        assert!(!rl.is_limited("b", now), "windows are per address");
    }

    #[test]
    fn window_slides_past_oldest() {
        let mut rl = limiter(2);
        let t0 = Instant::now();
        rl.record("a", t0);
        rl.record("a", t0 + Duration::from_secs(5));
        assert!(rl.is_limited("a", t0 + Duration::from_millis(9_999)));
        // oldest entry expires at exactly t0 + window
        assert!(!rl.is_limited("a", t0 + Duration::from_secs(10)));
        assert_eq!(rl.usage("a", t0 + Duration::from_secs(10)), 1);
        assert_eq!(rl.usage("a", t0 + Duration::from_secs(15)), 0);
    }
}
