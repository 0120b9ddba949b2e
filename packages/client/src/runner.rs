//! Client execution logic with reconnection support.

use std::time::Duration;

use super::{
    domain::should_attempt_reconnect,
    error::ClientError,
    session::{SessionEnd, run_client_session},
    ui::spawn_input_reader,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the signaling client with reconnection logic.
///
/// Every new session joins again under the same id.
pub async fn run_client(url: String, id: String) -> Result<(), ClientError> {
    let mut input_rx = spawn_input_reader(&id);
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            url,
            id,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url, &id, &mut input_rx).await {
            Ok(SessionEnd::UserExit) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    return Err(ClientError::ConnectionError(format!(
                        "failed to reconnect after {} attempts",
                        MAX_RECONNECT_ATTEMPTS
                    )));
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
