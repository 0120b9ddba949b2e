//! WebSocket signaling message DTOs.
//!
//! Every frame is a JSON object discriminated by its `type` field.
//! Signaling payloads (`offer`, `answer`, `candidate`) are opaque to the relay
//! and are carried as raw JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client → Server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Bind the sending session to a participant id
    #[serde(rename = "join")]
    Join { id: String },
    #[serde(rename = "offer")]
    Offer {
        target: String,
        from: String,
        offer: Value,
    },
    #[serde(rename = "answer")]
    Answer {
        target: String,
        from: String,
        answer: Value,
    },
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        target: String,
        from: String,
        candidate: Value,
    },
    #[serde(rename = "chat-message")]
    ChatMessage {
        target: String,
        from: String,
        message: String,
    },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Server → Client
///
/// Relayed signals keep their payload untouched; `target` is dropped and the
/// sender is carried in `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "offer")]
    Offer { offer: Value, from: String },
    #[serde(rename = "answer")]
    Answer { answer: Value, from: String },
    #[serde(rename = "ice-candidate")]
    IceCandidate { candidate: Value, from: String },
    #[serde(rename = "chat-message")]
    ChatMessage {
        message: String,
        from: String,
        /// Server-stamped, RFC 3339 UTC with millisecond precision
        timestamp: String,
    },
    /// Current participant ids in presence order (sent to every session)
    #[serde(rename = "userList")]
    UserList { users: Vec<String> },
    /// Sent to the offending session only
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
