//! WebRTC signaling relay server.
//!
//! Tracks participants by id and relays offer / answer / ice-candidate /
//! chat-message frames between two named peers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakehashi-server
//! cargo run --bin kakehashi-server -- --host 127.0.0.1 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use kakehashi_server::{
    config::{Args, ServerConfig},
    domain::{MessagePusher, ParticipantRegistry, RateLimiter},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, rate_limiter::InMemoryRateLimiter,
        repository::InMemoryParticipantRegistry,
    },
    ui::{
        CorsPolicy, MessageRouter, Server, StaticAssets, spawn_idle_reaper,
        spawn_rate_limit_cleanup,
    },
    usecase::{
        ConnectSessionUseCase, DisconnectParticipantUseCase, JoinParticipantUseCase,
        ListParticipantsUseCase, PresenceGate, ReapIdleParticipantsUseCase, RelayMessageUseCase,
    },
};
use kakehashi_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    tracing::debug!("Configuration: {:?}", config);

    // Initialize dependencies in order:
    // 1. Clock / Registry / RateLimiter / MessagePusher
    // 2. UseCases
    // 3. MessageRouter and background tasks
    // 4. Server

    // 1. Create infrastructure (in-memory, per process)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry: Arc<dyn ParticipantRegistry> =
        Arc::new(InMemoryParticipantRegistry::new(clock.clone()));
    let rate_limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(config.rate_limit, clock.clone()));
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

    // 2. Create UseCases (presence changes share one gate)
    let presence = PresenceGate::new();
    let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(message_pusher.clone()));
    let join_participant_usecase = Arc::new(JoinParticipantUseCase::new(
        registry.clone(),
        rate_limiter.clone(),
        message_pusher.clone(),
        presence.clone(),
    ));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        presence.clone(),
    ));
    let reap_idle_participants_usecase = Arc::new(ReapIdleParticipantsUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        clock.clone(),
        presence,
    ));
    let list_participants_usecase = Arc::new(ListParticipantsUseCase::new(registry.clone()));

    // 3. Create the router and start the timers
    let message_router = Arc::new(MessageRouter::new(
        connect_session_usecase,
        join_participant_usecase,
        relay_message_usecase,
        disconnect_participant_usecase,
        clock,
    ));
    let reaper = spawn_idle_reaper(
        reap_idle_participants_usecase,
        config.idle_timeout,
        config.reap_interval,
    );
    let cleanup = spawn_rate_limit_cleanup(rate_limiter, config.rate_limit_cleanup_interval);

    // 4. Create and run the server
    let server = Server::new(
        message_router,
        list_participants_usecase,
        StaticAssets::new(config.static_dir, config.static_max_age_secs),
        CorsPolicy::from_origins(&config.cors_allow_origins),
    );
    let result = server.run(config.host, config.port).await;

    reaper.abort();
    cleanup.abort();

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
