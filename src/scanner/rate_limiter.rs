//! Connection admission rate limiting.
//!
//! Token bucket over `governor`; one token per connection attempt, no burst,
//! so attempts are spread evenly across each second.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Caps connection attempts per second across all pipelines.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<GovLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` attempts per second.
    ///
    /// Returns `None` for a rate of 0, which means unlimited.
    pub fn new(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(
                Quota::per_second(rate).allow_burst(NonZeroU32::MIN),
            )),
        })
    }

    /// Wait until another attempt is allowed.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}
