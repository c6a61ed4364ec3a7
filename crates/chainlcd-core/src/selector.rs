//! Round-robin endpoint selection with cooldown and rate-limit exclusion.

use tokio::time::Instant;

use crate::endpoint::{Endpoint, EndpointConfig};
use crate::policy::{FailureCooldown, SlidingWindowLimiter};

/// Ordered endpoints plus the round-robin cursor.
///
/// Endpoint order is fixed at construction. `cursor < endpoints.len()`
/// whenever the list is non-empty.
#[derive(Debug)]
pub struct Selector {
    endpoints: Vec<Endpoint>,
    cursor: usize,
    cooldown: FailureCooldown,
}

impl Selector {
    pub fn new(endpoints: Vec<EndpointConfig>, cooldown: FailureCooldown) -> Self {
        Self {
            endpoints: endpoints.into_iter().map(Endpoint::new).collect(),
            cursor: 0,
            cooldown,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn cooldown(&self) -> &FailureCooldown {
        &self.cooldown
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(index)
    }

    /// Pick the index of the next endpoint to try.
    ///
    /// Scans at most `len` candidates from the cursor, moving the cursor
    /// past each one examined. A candidate is skipped while cooling down or
    /// rate limited. When every candidate is skipped the first endpoint is
    /// returned anyway; `None` only for an empty list.
    pub fn pick(&mut self, limiter: &mut SlidingWindowLimiter, now: Instant) -> Option<usize> {
        let len = self.endpoints.len();
        if len == 0 {
            return None;
        }

        for _ in 0..len {
            let idx = self.cursor;
            self.cursor = (self.cursor + 1) % len;

            let endpoint = &mut self.endpoints[idx];
            if !self.cooldown.admit(endpoint, now) {
                tracing::trace!(endpoint = %endpoint.address(), "skipping: cooling down");
                continue;
            }
            if limiter.is_limited(endpoint.address(), now) {
                tracing::trace!(endpoint = %endpoint.address(), "skipping: rate limited");
                continue;
            }
            return Some(idx);
        }

        tracing::debug!(
            endpoint = %self.endpoints[0].address(),
            "all endpoints excluded, falling back to the first"
        );
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::policy::{CooldownConfig, RateLimiterConfig};

    fn configs(addrs: &[&str]) -> Vec<EndpointConfig> {
        addrs
            .iter()
            .map(|a| EndpointConfig::new(*a, "test").unwrap())
            .collect()
    }

    fn selector(addrs: &[&str]) -> Selector {
        Selector::new(configs(addrs), FailureCooldown::new(CooldownConfig::default()))
    }

    fn limiter(max: usize) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimiterConfig {
            window: Duration::from_secs(10),
            max_requests: max,
        })
    }

    fn picked(s: &mut Selector, rl: &mut SlidingWindowLimiter, now: Instant) -> String {
        let idx = s.pick(rl, now).unwrap();
        s.endpoints()[idx].address().to_string()
    }

    #[test]
    fn empty_list_yields_none() {
        let mut s = selector(&[]);
        assert!(s.pick(&mut limiter(50), Instant::now()).is_none());
    }

    #[test]
    fn round_robin_visits_each_once() {
        let mut s = selector(&["https://a.com", "https://b.com", "https://c.com"]);
        let mut rl = limiter(50);
        let now = Instant::now();
        let order: Vec<_> = (0..4).map(|_| picked(&mut s, &mut rl, now)).collect();
        assert_eq!(
            order,
            ["https://a.com", "https://b.com", "https://c.com", "https://a.com"]
        );
    }

    #[test]
    fn cursor_advances_past_skipped_candidates() {
        let mut s = selector(&["https://a.com", "https://b.com", "https://c.com"]);
        let mut rl = limiter(50);
        let now = Instant::now();
        for _ in 0..3 {
            s.get_mut(0).unwrap().record_failure(now);
        }
        assert_eq!(picked(&mut s, &mut rl, now), "https://b.com");
        assert_eq!(s.cursor(), 2);
        assert_eq!(picked(&mut s, &mut rl, now), "https://c.com");
        assert_eq!(s.cursor(), 0);
        // a is still cooling down: scan examines a, then returns b
        assert_eq!(picked(&mut s, &mut rl, now), "https://b.com");
    }

    #[test]
    fn rate_limited_endpoint_skipped() {
        let mut s = selector(&["https://a.com", "https://b.com"]);
        let mut rl = limiter(2);
        let now = Instant::now();
        rl.record("https://a.com", now);
        rl.record("https://a.com", now);
        assert_eq!(picked(&mut s, &mut rl, now), "https://b.com");
        assert_eq!(picked(&mut s, &mut rl, now), "https://b.com");
        assert_eq!(
            picked(&mut s, &mut rl, now + Duration::from_secs(10)),
            "https://a.com"
        );
    }

    #[test]
    fn fallback_to_first_when_everything_excluded() {
        let mut s = selector(&["https://a.com", "https://b.com", "https://c.com"]);
        let mut rl = limiter(1);
        let now = Instant::now();
        for i in 0..3 {
            let ep = s.get_mut(i).unwrap();
            for _ in 0..3 {
                ep.record_failure(now);
            }
            rl.record(ep.address(), now);
        }
        s.cursor = 1;
        assert_eq!(picked(&mut s, &mut rl, now), "https://a.com");
        assert_eq!(s.cursor(), 1, "full scan wraps the cursor back to its start");
    }

    #[test]
    fn lazy_reset_happens_even_if_rate_limited() {
        let mut s = selector(&["https://a.com", "https://b.com"]);
        let mut rl = limiter(1);
        let t0 = Instant::now();
        for _ in 0..3 {
            s.get_mut(0).unwrap().record_failure(t0);
        }
        let later = t0 + Duration::from_secs(60);
        rl.record("https://a.com", later);
        assert_eq!(picked(&mut s, &mut rl, later), "https://b.com");
        assert_eq!(s.endpoints()[0].failure_count(), 0);
    }
}
