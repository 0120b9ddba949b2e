//! Data Transfer Objects (DTOs) for the signaling relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket signaling message DTOs
//! - `http`: HTTP API response DTOs
//! - `conversion`: Domain Model → DTO conversions

pub mod conversion;
pub mod http;
pub mod websocket;
