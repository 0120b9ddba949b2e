//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use kakehashi_server::infrastructure::dto::websocket::{ClientMessage, ServerMessage};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::{
    domain::{Command, parse_command},
    error::ClientError,
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// How a session ended without a connection error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input reader closed (Ctrl+C / Ctrl+D)
    UserExit,
}

/// Run one WebSocket client session: connect, join, then relay input lines
/// until the user quits or the connection is lost.
pub async fn run_client_session(
    url: &str,
    id: &str,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to signaling server!");

    let (mut write, mut read) = ws_stream.split();

    // Join right away; the relay answers with the participant list
    send_message(&mut write, &ClientMessage::Join { id: id.to_string() }).await?;

    println!(
        "\nYou are '{}'. Type /help for commands. Press Ctrl+C to exit.\n",
        id
    );

    // Spawn a task to handle incoming messages
    let id_for_read = id.to_string();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!("{}", format_incoming(text.as_str(), &id_for_read));
                    redisplay_prompt(&id_for_read);
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&id_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut read_task => {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    read_task.abort();
                    let _ = write.close().await;
                    return Ok(SessionEnd::UserExit);
                };
                if let Err(e) = handle_line(&mut write, id, &line).await {
                    read_task.abort();
                    return Err(e);
                }
                redisplay_prompt(id);
            }
        }
    }
}

/// Turn one input line into an outgoing message.
///
/// Invalid commands are reported locally and never end the session.
async fn handle_line(write: &mut WsSink, id: &str, line: &str) -> Result<(), ClientError> {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            print!("{}", MessageFormatter::format_input_error(&e.to_string()));
            return Ok(());
        }
    };

    if command == Command::Help {
        print!("{}", MessageFormatter::format_help());
        return Ok(());
    }

    let Some(message) = command.into_message(id) else {
        return Ok(());
    };
    send_message(write, &message).await?;
    if let Some((kind, target)) = describe(&message) {
        print!("{}", MessageFormatter::format_sent_confirmation(kind, target));
    }
    Ok(())
}

async fn send_message(write: &mut WsSink, message: &ClientMessage) -> Result<(), ClientError> {
    let json = message
        .to_json()
        .map_err(|e| ClientError::InvalidCommand(e.to_string()))?;
    write
        .send(Message::text(json))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}

fn describe(message: &ClientMessage) -> Option<(&'static str, &str)> {
    match message {
        ClientMessage::Join { .. } => None,
        ClientMessage::Offer { target, .. } => Some(("offer", target)),
        ClientMessage::Answer { target, .. } => Some(("answer", target)),
        ClientMessage::IceCandidate { target, .. } => Some(("ice-candidate", target)),
        ClientMessage::ChatMessage { target, .. } => Some(("message", target)),
    }
}

/// Render one frame received from the relay.
fn format_incoming(text: &str, current_id: &str) -> String {
    match ServerMessage::from_json(text) {
        Ok(ServerMessage::UserList { users }) => {
            MessageFormatter::format_user_list(&users, current_id)
        }
        Ok(ServerMessage::ChatMessage {
            message,
            from,
            timestamp,
        }) => MessageFormatter::format_chat_message(&from, &message, &timestamp),
        Ok(ServerMessage::Offer { offer, from }) => {
            MessageFormatter::format_signal("offer", &from, &offer)
        }
        Ok(ServerMessage::Answer { answer, from }) => {
            MessageFormatter::format_signal("answer", &from, &answer)
        }
        Ok(ServerMessage::IceCandidate { candidate, from }) => {
            MessageFormatter::format_signal("ice-candidate", &from, &candidate)
        }
        Ok(ServerMessage::Error { message }) => MessageFormatter::format_server_error(&message),
        // If parsing fails, display as raw text
        Err(_) => MessageFormatter::format_raw_message(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_incoming_user_list() {
        // テスト項目: userList が参加者一覧として表示される
        // given (前提条件):
        let text = r#"{"type":"userList","users":["alice","bob"]}"#;

        // when (操作):
        let result = format_incoming(text, "bob");

        // then (期待する結果):
        assert!(result.contains("alice\n"));
        assert!(result.contains("bob (me)"));
    }

    #[test]
    fn test_format_incoming_offer() {
        // テスト項目: 転送された offer が送信者付きで表示される
        // given (前提条件):
        let text = r#"{"type":"offer","offer":{"sdp":"v=0"},"from":"alice"}"#;

        // when (操作):
        let result = format_incoming(text, "bob");

        // then (期待する結果):
        assert!(result.contains("offer from alice"));
    }

    #[test]
    fn test_format_incoming_unknown_is_raw() {
        // テスト項目: 解釈できないメッセージはそのまま表示される
        let result = format_incoming("plain text", "bob");
        assert!(result.contains("Received: plain text"));
    }

    #[test]
    fn test_describe_chat_message() {
        // テスト項目: 送信確認の表示内容が宛先を含む
        let message = ClientMessage::ChatMessage {
            target: "bob".to_string(),
            from: "alice".to_string(),
            message: "hi".to_string(),
        };
        assert_eq!(describe(&message), Some(("message", "bob")));
    }
}
