//! Domain errors.

use thiserror::Error;

/// Validation errors raised when constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("participant id must not be empty")]
    ParticipantIdEmpty,

    #[error("participant id is {len} characters long (max {max})")]
    ParticipantIdTooLong { len: usize, max: usize },
}

/// Errors raised while handing a message to a session's transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// No outbound channel is registered for the session
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    /// The session's outbound channel is closed
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
