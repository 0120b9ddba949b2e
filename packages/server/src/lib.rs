//! WebRTC signaling relay library.
//!
//! This library tracks participants by logical identity, binds them to
//! WebSocket sessions and relays opaque signaling messages
//! (offer / answer / ice-candidate / chat-message) between two named peers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// configuration
pub mod config;
