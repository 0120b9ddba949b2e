//! Infrastructure layer: in-memory stores, WebSocket message pushing and
//! wire DTOs.

pub mod dto;
pub mod message_pusher;
pub mod rate_limiter;
pub mod repository;
