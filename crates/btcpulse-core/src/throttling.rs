use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Upstream quota budget for a single provider.
///
/// Separate from the aggregator's cool-down: this caps the raw request rate an
/// adapter may issue for data fetches. Health probes bypass it.
#[derive(Clone)]
pub struct QuotaGuard {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
}

impl QuotaGuard {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let clock = DefaultClock::default();
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct_with_clock(quota, &clock)),
            clock,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Takes one unit of budget, or returns how long until the next unit frees up.
    pub fn acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(safe_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_when_budget_is_exhausted() {
        let guard = QuotaGuard::new(Duration::from_secs(60), 2);

        assert!(guard.acquire().is_ok());
        assert!(guard.acquire().is_ok());

        let retry_in = guard.acquire().expect_err("third request exceeds budget");
        assert!(retry_in > Duration::ZERO);
        assert!(retry_in <= Duration::from_secs(30));
    }

    #[test]
    fn zero_limit_still_allows_one_request() {
        let guard = QuotaGuard::new(Duration::from_secs(60), 0);
        assert!(guard.acquire().is_ok());
        assert!(guard.acquire().is_err());
    }

    #[test]
    fn clones_share_budget() {
        let guard = QuotaGuard::new(Duration::from_secs(60), 1);
        let shared = guard.clone();
        assert!(guard.acquire().is_ok());
        assert!(shared.acquire().is_err());
    }
}
