//! Failure cooldown: a simplified two-state breaker evaluated lazily.
//!
//! State transitions:
//! - `Available` → `CoolingDown`: failure count reaches `max_failures`
//! - `CoolingDown` → `Available`: `cooldown` has elapsed since the last
//!   failure; the count is reset at the moment the endpoint is next examined

use std::time::Duration;

use tokio::time::Instant;

use crate::endpoint::Endpoint;

/// Cooldown state of one endpoint at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    /// Eligible for selection.
    Available,
    /// Skipped until `remaining` has passed.
    CoolingDown { remaining: Duration },
}

#[derive(Debug, Clone)]
pub struct CooldownConfig {
    /// Failures before the endpoint is skipped.
    pub max_failures: u32,
    /// How long the endpoint is skipped after its latest failure.
    pub cooldown: Duration,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Stateless rule; the state it reads and resets lives on the [`Endpoint`].
#[derive(Debug, Clone)]
pub struct FailureCooldown {
    config: CooldownConfig,
}

impl FailureCooldown {
    pub fn new(config: CooldownConfig) -> Self {
        Self { config }
    }

    pub fn max_failures(&self) -> u32 {
        self.config.max_failures
    }

    /// Current state without side effects.
    pub fn state(&self, endpoint: &Endpoint, now: Instant) -> CooldownState {
        if endpoint.failure_count() < self.config.max_failures {
            return CooldownState::Available;
        }
        let elapsed = endpoint
            .last_failure_at()
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::MAX);
        if elapsed < self.config.cooldown {
            CooldownState::CoolingDown {
                remaining: self.config.cooldown - elapsed,
            }
        } else {
            CooldownState::Available
        }
    }

    /// Returns `true` if the endpoint may be selected at `now`.
    ///
    /// An endpoint whose cooldown has expired has its failure count reset.
    pub fn admit(&self, endpoint: &mut Endpoint, now: Instant) -> bool {
        if endpoint.failure_count() < self.config.max_failures {
            return true;
        }
        match self.state(endpoint, now) {
            CooldownState::CoolingDown { .. } => false,
            CooldownState::Available => {
                endpoint.record_success();
                tracing::info!(endpoint = %endpoint.address(), "cooldown elapsed, endpoint re-admitted");
                true
            }
        }
    }

    /// Returns `true` if the failure count is below the threshold.
    pub fn is_below_threshold(&self, endpoint: &Endpoint) -> bool {
        endpoint.failure_count() < self.config.max_failures
    }
}
