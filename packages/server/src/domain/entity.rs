//! Domain entities.

use super::value_object::{ParticipantId, SessionId, Timestamp};

/// A logical identity bound to a live transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub session: SessionId,
    /// Set once at registration
    pub joined_at: Timestamp,
    /// Updated on every routed message sent by this participant
    pub last_activity_at: Timestamp,
}

impl Participant {
    /// Create a participant whose activity timestamp equals its join time.
    pub fn new(id: ParticipantId, session: SessionId, joined_at: Timestamp) -> Self {
        Self {
            id,
            session,
            joined_at,
            last_activity_at: joined_at,
        }
    }

    /// Record activity at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_activity_at = now;
    }

    /// Whether the last activity happened strictly before `cutoff`.
    pub fn is_idle_since(&self, cutoff: Timestamp) -> bool {
        self.last_activity_at < cutoff
    }
}

/// Per-client-address request counter for one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Timestamp,
}

impl RateLimitEntry {
    /// Start a new window at `now`, counting the triggering request.
    pub fn start(now: Timestamp, window_millis: i64) -> Self {
        Self {
            count: 1,
            window_reset_at: Timestamp::new(now.value().saturating_add(window_millis)),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.window_reset_at
    }

    /// Count one more request, resetting the window first if it has expired.
    ///
    /// Returns the count after the request has been recorded.
    pub fn record(&mut self, now: Timestamp, window_millis: i64) -> u32 {
        if self.is_expired(now) {
            *self = Self::start(now, window_millis);
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.count
    }
}
