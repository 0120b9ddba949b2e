//! Message formatting utilities for client display.

use serde_json::Value;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the participant list, marking the current participant
    ///
    /// # Arguments
    ///
    /// * `users` - Participant ids in presence order
    /// * `current_id` - The current participant's id (to mark as "me")
    pub fn format_user_list(users: &[String], current_id: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Participants:\n");

        if users.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for user in users {
                let me_suffix = if user == current_id { " (me)" } else { "" };
                output.push_str(&format!("{}{}\n", user, me_suffix));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a relayed chat message
    ///
    /// # Arguments
    ///
    /// * `from` - The participant id of the sender
    /// * `message` - The message content
    /// * `timestamp` - Server-stamped RFC 3339 time
    pub fn format_chat_message(from: &str, message: &str, timestamp: &str) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            from, message, timestamp
        )
    }

    /// Format a relayed offer / answer / ice-candidate
    ///
    /// # Arguments
    ///
    /// * `kind` - The message type (`offer`, `answer`, `ice-candidate`)
    /// * `from` - The participant id of the sender
    /// * `payload` - The opaque signaling payload
    pub fn format_signal(kind: &str, from: &str, payload: &Value) -> String {
        format!("\n← {} from {}: {}\n", kind, from, payload)
    }

    /// Format an error reported by the server
    pub fn format_server_error(message: &str) -> String {
        format!("\n! Server error: {}\n", message)
    }

    /// Format a locally rejected input line
    pub fn format_input_error(message: &str) -> String {
        format!("! {}\n", message)
    }

    /// Usage shown for `/help`
    pub fn format_help() -> String {
        "Commands:\n  \
         @<id> <message>       send a chat message\n  \
         /offer <id> <json>    relay an SDP offer\n  \
         /answer <id> <json>   relay an SDP answer\n  \
         /ice <id> <json>      relay an ICE candidate\n  \
         /help                 show this help\n"
            .to_string()
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(kind: &str, target: &str) -> String {
        format!("{} sent to {}\n", kind, target)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_user_list_with_empty_participants() {
        // テスト項目: 参加者が空の場合、適切なメッセージが表示される
        // given (前提条件):
        let users: Vec<String> = vec![];

        // when (操作):
        let result = MessageFormatter::format_user_list(&users, "alice");

        // then (期待する結果):
        assert!(result.contains("Participants:"));
        assert!(result.contains("(No participants)"));
    }

    #[test]
    fn test_format_user_list_marks_me() {
        // テスト項目: 複数参加者の場合、全員が表示され自分にはマークが付く
        // given (前提条件):
        let users = vec!["alice".to_string(), "bob".to_string()];

        // when (操作):
        let result = MessageFormatter::format_user_list(&users, "alice");

        // then (期待する結果):
        assert!(result.contains("alice (me)\n"));
        assert!(result.contains("bob\n"));
        assert!(!result.contains("bob (me)"));
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージに送信者、本文、時刻が含まれる
        // given (前提条件):
        let timestamp = "2024-01-01T00:00:00.000Z";

        // when (操作):
        let result = MessageFormatter::format_chat_message("bob", "Hello!", timestamp);

        // then (期待する結果):
        assert!(result.contains("@bob: Hello!"));
        assert!(result.contains("sent at 2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_format_signal() {
        // テスト項目: シグナリングメッセージの種類、送信者、ペイロードが表示される
        // given (前提条件):
        let payload = json!({"sdp": "v=0"});

        // when (操作):
        let result = MessageFormatter::format_signal("offer", "alice", &payload);

        // then (期待する結果):
        assert_eq!(result, "\n← offer from alice: {\"sdp\":\"v=0\"}\n");
    }

    #[test]
    fn test_format_help_lists_every_command() {
        // テスト項目: ヘルプに全てのコマンドが含まれる
        let help = MessageFormatter::format_help();
        for command in ["@<id>", "/offer", "/answer", "/ice", "/help"] {
            assert!(help.contains(command), "missing {}", command);
        }
    }

    #[test]
    fn test_format_server_error() {
        // テスト項目: サーバーエラーが表示される
        let result = MessageFormatter::format_server_error("Too many requests");
        assert!(result.contains("Server error: Too many requests"));
    }

    #[test]
    fn test_format_binary_message() {
        // テスト項目: バイナリメッセージのバイト数が表示される
        let result = MessageFormatter::format_binary_message(1024);
        assert!(result.contains("1024 bytes"));
    }
}
