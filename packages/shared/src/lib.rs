//! Utilities shared by the Kakehashi server and client.

pub mod logger;
pub mod time;
