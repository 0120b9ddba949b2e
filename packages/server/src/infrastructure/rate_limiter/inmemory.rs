//! Fixed-window rate limiter keyed by client IP address.
//!
//! Each address owns one [`RateLimitEntry`]. The check and the increment
//! happen under the same lock, so bursts from one address cannot undercount.
//! Expired entries are only dropped by [`RateLimiter::cleanup`], which the
//! server runs on a timer to bound memory.

use std::{
    collections::{HashMap, hash_map::Entry},
    net::IpAddr,
    sync::Arc,
};

use async_trait::async_trait;
use kakehashi_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{RateLimitEntry, RateLimitPolicy, RateLimiter, Timestamp};

pub struct InMemoryRateLimiter {
    entries: Mutex<HashMap<IpAddr, RateLimitEntry>>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    /// Number of addresses currently tracked.
    pub async fn tracked_addresses(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn should_limit(&self, address: IpAddr) -> bool {
        let now = Timestamp::new(self.clock.now_millis());
        let window_millis = self.policy.window_millis();

        let mut entries = self.entries.lock().await;
        let count = match entries.entry(address) {
            Entry::Occupied(mut occupied) => occupied.get_mut().record(now, window_millis),
            Entry::Vacant(vacant) => {
                vacant
                    .insert(RateLimitEntry::start(now, window_millis))
                    .count
            }
        };

        let limited = count > self.policy.max_requests;
        if limited {
            tracing::debug!(
                "Rate limit exceeded for {} ({} requests in window, max {})",
                address,
                count,
                self.policy.max_requests
            );
        }
        limited
    }

    async fn cleanup(&self) -> usize {
        let now = Timestamp::new(self.clock.now_millis());
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}
