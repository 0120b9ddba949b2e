//! CLI client for the signaling relay.
//!
//! Joins under a participant id, prints the participant list and every
//! frame relayed to it, and sends chat / offer / answer / ice-candidate
//! frames typed at the prompt. Reconnects on disconnection (max 5 attempts
//! with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakehashi-client -- --id alice
//! cargo run --bin kakehashi-client -- -i bob -u ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;
use kakehashi_server::domain::ParticipantId;
use kakehashi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kakehashi-client")]
#[command(about = "CLI client for the Kakehashi WebRTC signaling relay", long_about = None)]
struct Args {
    /// Participant id to join under
    #[arg(short = 'i', long)]
    id: String,

    /// Signaling server WebSocket URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = ParticipantId::try_from(args.id.clone()) {
        tracing::error!("Invalid participant id '{}': {}", args.id, e);
        std::process::exit(1);
    }

    if let Err(e) = kakehashi_client::run_client(args.url, args.id).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
