//! Server configuration: CLI flags with environment fallbacks.

use std::{path::PathBuf, time::Duration};

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

use crate::domain::RateLimitPolicy;

/// Upper bound for every configured period (one year).
pub const MAX_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

/// CLI arguments for the signaling server.
#[derive(Parser, Debug, Clone)]
#[command(name = "kakehashi-server")]
#[command(about = "WebRTC signaling relay with presence tracking", long_about = None)]
#[command(version)]
pub struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000", env = "PORT")]
    pub port: u16,

    /// Join requests allowed per client address and window
    #[arg(long, default_value = "100", env = "RATE_LIMIT_MAX_REQUESTS")]
    pub rate_limit_max_requests: u32,

    /// Rate limit window in seconds
    #[arg(long, default_value = "60", env = "RATE_LIMIT_WINDOW_SECS")]
    pub rate_limit_window_secs: u64,

    /// Interval between expired rate limit entry sweeps, in seconds
    #[arg(long, default_value = "300", env = "RATE_LIMIT_CLEANUP_INTERVAL_SECS")]
    pub rate_limit_cleanup_interval_secs: u64,

    /// Participants without activity for this many seconds are evicted
    #[arg(long, default_value = "1800", env = "IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: u64,

    /// Interval between idle participant sweeps, in seconds
    #[arg(long, default_value = "300", env = "REAP_INTERVAL_SECS")]
    pub reap_interval_secs: u64,

    /// Directory served as static assets
    #[arg(long, default_value = "public", env = "STATIC_DIR")]
    pub static_dir: PathBuf,

    /// `Cache-Control` max-age for static assets in seconds (0 = no-cache)
    #[arg(long, default_value = "0", env = "STATIC_MAX_AGE_SECS")]
    pub static_max_age_secs: u64,

    /// Origins allowed by CORS, comma separated (`*` = any origin)
    #[arg(long, default_value = "*", env = "CORS_ALLOW_ORIGIN", value_delimiter = ',')]
    pub cors_allow_origin: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
    #[error("{0} must not exceed {max} seconds", max = MAX_PERIOD_SECS)]
    TooLarge(&'static str),
    #[error("invalid CORS origin '{0}'")]
    InvalidOrigin(String),
}

/// Runtime configuration derived from [`Args`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit: RateLimitPolicy,
    pub rate_limit_cleanup_interval: Duration,
    pub idle_timeout: Duration,
    pub reap_interval: Duration,
    pub static_dir: PathBuf,
    pub static_max_age_secs: u64,
    pub cors_allow_origins: Vec<String>,
}

impl ServerConfig {
    /// Validates that every period lies in `1..=MAX_PERIOD_SECS` seconds and
    /// every CORS origin is usable as a header value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("rate_limit_window_secs", self.rate_limit.window),
            (
                "rate_limit_cleanup_interval_secs",
                self.rate_limit_cleanup_interval,
            ),
            ("idle_timeout_secs", self.idle_timeout),
            ("reap_interval_secs", self.reap_interval),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                return Err(ConfigError::Zero(name));
            }
            if period > Duration::from_secs(MAX_PERIOD_SECS) {
                return Err(ConfigError::TooLarge(name));
            }
        }
        for origin in &self.cors_allow_origins {
            if origin.is_empty() || HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::InvalidOrigin(origin.clone()));
            }
        }
        Ok(())
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            rate_limit: RateLimitPolicy::new(
                args.rate_limit_max_requests,
                Duration::from_secs(args.rate_limit_window_secs),
            ),
            rate_limit_cleanup_interval: Duration::from_secs(
                args.rate_limit_cleanup_interval_secs,
            ),
            idle_timeout: Duration::from_secs(args.idle_timeout_secs),
            reap_interval: Duration::from_secs(args.reap_interval_secs),
            static_dir: args.static_dir,
            static_max_age_secs: args.static_max_age_secs,
            cors_allow_origins: args.cors_allow_origin,
        }
    }
}
