//! Error types for the signaling client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection could not be established or was lost
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Input line could not be turned into a message
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
