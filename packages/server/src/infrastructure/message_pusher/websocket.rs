//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - セッションごとの `UnboundedSender<OutboundFrame>` を管理
//! - セッションへのメッセージ送信（push_to, broadcast_all）とクローズ要求（close）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、メッセージ送信に使用します。
//! 送信ループ側は `OutboundFrame::Close` を受け取るとクローズフレームを送って終了します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessagePushError, MessagePusher, OutboundFrame, PusherChannel, SessionId};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_session(session, tx).await;
///
/// pusher.push_to(&session, "{\"type\":\"userList\",\"users\":[]}").await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のセッションの sender
    sessions: Mutex<HashMap<SessionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続中のセッション数
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn send_frame(
        &self,
        session: &SessionId,
        frame: OutboundFrame,
    ) -> Result<(), MessagePushError> {
        let sessions = self.sessions.lock().await;
        let sender = sessions
            .get(session)
            .ok_or_else(|| MessagePushError::SessionNotFound(session.to_string()))?;
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_session(&self, session: SessionId, sender: PusherChannel) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session, sender);
        tracing::debug!("Session {} registered to MessagePusher", session);
    }

    async fn unregister_session(&self, session: &SessionId) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session);
        tracing::debug!("Session {} unregistered from MessagePusher", session);
    }

    async fn push_to(&self, session: &SessionId, content: &str) -> Result<(), MessagePushError> {
        self.send_frame(session, OutboundFrame::Text(content.to_string()))
            .await?;
        tracing::debug!("Pushed message to session {}", session);
        Ok(())
    }

    async fn broadcast_all(&self, content: &str) {
        let sessions = self.sessions.lock().await;

        for (session, sender) in sessions.iter() {
            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = sender.send(OutboundFrame::Text(content.to_string())) {
                tracing::warn!("Failed to push message to session {}: {}", session, e);
            }
        }
        tracing::debug!("Broadcasted message to {} sessions", sessions.len());
    }

    async fn close(&self, session: &SessionId) -> Result<(), MessagePushError> {
        self.send_frame(session, OutboundFrame::Close).await?;
        tracing::debug!("Requested close of session {}", session);
        Ok(())
    }
}
