//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{OutboundFrame, SessionId},
    ui::{signaling::TransportEvent, state::AppState},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, remote))
}

/// Spawns a task that forwards outbound frames from the rx channel to the WebSocket sender.
///
/// `OutboundFrame::Close` sends a close frame and ends the task, which in turn
/// ends the connection.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames addressed to this session
/// * `sender` - WebSocket sink of this session
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, remote: SocketAddr) {
    let session = SessionId::generate();
    let address = remote.ip();
    let (sender, mut receiver) = socket.split();

    // Register the outbound channel before reading anything
    let (tx, rx) = mpsc::unbounded_channel();
    if let Err(e) = state
        .message_router
        .handle(TransportEvent::Connected {
            session,
            address,
            sender: tx,
        })
        .await
    {
        tracing::error!("Failed to register session {}: {}", session, e);
        return;
    }

    let router = state.message_router.clone();

    // Spawn a task to receive messages from this session
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on session {}: {}", session, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::trace!("Received text on session {}: {}", session, text.as_str());
                    let event = TransportEvent::Message {
                        session,
                        address,
                        text: text.as_str().to_owned(),
                    };
                    if let Err(e) = router.handle(event).await {
                        tracing::warn!("Dropped message on session {}: {}", session, e);
                    }
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::trace!("Received ping on session {}", session);
                }
                Message::Close(_) => {
                    tracing::debug!("Session {} requested close", session);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push outbound frames to this session
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            if let Err(e) = result
                && e.is_panic()
            {
                tracing::error!("Receive task of session {} panicked: {}", session, e);
            }
        }
        _ = &mut send_task => recv_task.abort(),
    };

    if let Err(e) = state
        .message_router
        .handle(TransportEvent::Disconnected { session })
        .await
    {
        tracing::error!("Failed to clean up session {}: {}", session, e);
    }
}
