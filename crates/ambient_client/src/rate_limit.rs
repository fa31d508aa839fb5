//! Request pacing for AmbientWeather.net.
//!
//! The API allows one request per second per API key; requests are spaced
//! 1.1 s apart.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Minimum spacing between requests.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Single-bucket limiter shared by all clones of a client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_interval(MIN_REQUEST_INTERVAL)
    }

    /// One request per `interval`, no bursting.
    pub fn with_interval(interval: Duration) -> Self {
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to take a slot without waiting. Returns true if acquired.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_request_must_wait() {
        let limiter = RateLimiter::new();
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_clones_share_the_bucket() {
        let limiter = RateLimiter::with_interval(Duration::from_secs(60));
        let clone = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!clone.try_acquire());
    }
}
