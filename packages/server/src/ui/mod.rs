//! WebRTC signaling server: axum transport, message routing and timers.

mod background;
mod handler;
mod server;
mod signal;
pub mod signaling;
pub mod state;

pub use background::{spawn_idle_reaper, spawn_rate_limit_cleanup};
pub use server::{CorsPolicy, Server, StaticAssets};
pub use signaling::{MessageRouter, RouterError, TransportEvent};
