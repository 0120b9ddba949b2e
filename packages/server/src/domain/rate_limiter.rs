//! Rate limiting abstraction used to gate join requests.

use std::{net::IpAddr, time::Duration};

use async_trait::async_trait;

/// Default maximum number of requests per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;
/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Threshold and window of a fixed-window rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Requests allowed per window; request `max_requests + 1` is limited
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn window_millis(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

/// Per-client-address request counter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request from `address` and report whether it must be refused.
    ///
    /// The first request of a window is never limited.
    async fn should_limit(&self, address: IpAddr) -> bool;

    /// Drop entries whose window has expired. Returns the number removed.
    async fn cleanup(&self) -> usize;
}
