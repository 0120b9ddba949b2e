//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use kakehashi_server::infrastructure::dto::websocket::ClientMessage;
use serde_json::Value;

use crate::error::ClientError;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `@target message`
    Chat { target: String, message: String },
    /// `/offer target <json>`
    Offer { target: String, payload: Value },
    /// `/answer target <json>`
    Answer { target: String, payload: Value },
    /// `/ice target <json>`
    IceCandidate { target: String, payload: Value },
    /// `/help`
    Help,
}

impl Command {
    /// Build the wire message sent as `from`. `Help` is handled locally.
    pub fn into_message(self, from: &str) -> Option<ClientMessage> {
        let from = from.to_string();
        match self {
            Command::Chat { target, message } => Some(ClientMessage::ChatMessage {
                target,
                from,
                message,
            }),
            Command::Offer { target, payload } => Some(ClientMessage::Offer {
                target,
                from,
                offer: payload,
            }),
            Command::Answer { target, payload } => Some(ClientMessage::Answer {
                target,
                from,
                answer: payload,
            }),
            Command::IceCandidate { target, payload } => Some(ClientMessage::IceCandidate {
                target,
                from,
                candidate: payload,
            }),
            Command::Help => None,
        }
    }
}

/// Parse one input line.
///
/// # Errors
///
/// Returns `ClientError::InvalidCommand` for unknown commands, missing
/// targets or payloads that are not valid JSON.
pub fn parse_command(line: &str) -> Result<Command, ClientError> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('@') {
        let (target, message) = split_target(rest)?;
        if message.is_empty() {
            return Err(ClientError::InvalidCommand(
                "chat message is empty".to_string(),
            ));
        }
        return Ok(Command::Chat {
            target: target.to_string(),
            message: message.to_string(),
        });
    }

    let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
    match name {
        "/help" => Ok(Command::Help),
        "/offer" => {
            let (target, payload) = parse_signal(rest)?;
            Ok(Command::Offer { target, payload })
        }
        "/answer" => {
            let (target, payload) = parse_signal(rest)?;
            Ok(Command::Answer { target, payload })
        }
        "/ice" => {
            let (target, payload) = parse_signal(rest)?;
            Ok(Command::IceCandidate { target, payload })
        }
        _ => Err(ClientError::InvalidCommand(format!(
            "'{}' (type /help for usage)",
            name
        ))),
    }
}

fn split_target(rest: &str) -> Result<(&str, &str), ClientError> {
    let rest = rest.trim_start();
    let (target, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
    if target.is_empty() {
        return Err(ClientError::InvalidCommand("target is missing".to_string()));
    }
    Ok((target, remainder.trim()))
}

fn parse_signal(rest: &str) -> Result<(String, Value), ClientError> {
    let (target, payload) = split_target(rest)?;
    if payload.is_empty() {
        return Err(ClientError::InvalidCommand("payload is missing".to_string()));
    }
    let payload = serde_json::from_str(payload)
        .map_err(|e| ClientError::InvalidCommand(format!("payload is not JSON: {}", e)))?;
    Ok((target.to_string(), payload))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(current_attempt: u32, max_attempts: u32) -> bool {
    current_attempt < max_attempts
}
