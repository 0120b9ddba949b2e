//! Rate limiter implementations.

pub mod inmemory;

pub use inmemory::InMemoryRateLimiter;
