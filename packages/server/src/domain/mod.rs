//! Domain layer: value objects, entities and the abstractions that the
//! use cases depend on.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod rate_limiter;
pub mod repository;
pub mod value_object;

pub use entity::{Participant, RateLimitEntry};
pub use error::{MessagePushError, ValueObjectError};
pub use message_pusher::{MessagePusher, OutboundFrame, PusherChannel};
pub use rate_limiter::{RateLimitPolicy, RateLimiter};
pub use repository::ParticipantRegistry;
pub use value_object::{ParticipantId, SessionId, Timestamp};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use rate_limiter::MockRateLimiter;
#[cfg(test)]
pub use repository::MockParticipantRegistry;
