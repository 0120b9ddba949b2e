//! CLI signaling client for the Kakehashi relay.
//!
//! Joins the relay under an id, prints presence updates and relayed
//! messages, and sends chat / offer / answer / ice-candidate messages typed
//! on stdin.

pub mod domain;
pub mod error;
pub mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
