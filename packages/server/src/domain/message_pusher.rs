//! MessagePusher trait 定義
//!
//! セッションへのメッセージ送信（通知）のインターフェース。
//! WebSocket などの具体的な実装は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, SessionId};

/// セッションの送信ループに渡すフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// テキストメッセージ（JSON）
    Text(String),
    /// 接続をクローズする
    Close,
}

/// セッションごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<OutboundFrame>;

/// MessagePusher trait
///
/// 送信は fire-and-forget。配送の完了は追跡しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// セッションの送信チャンネルを登録
    async fn register_session(&self, session: SessionId, sender: PusherChannel);

    /// セッションの送信チャンネルを登録解除
    async fn unregister_session(&self, session: &SessionId);

    /// 特定のセッションに送信
    async fn push_to(&self, session: &SessionId, content: &str) -> Result<(), MessagePushError>;

    /// 接続中の全てのセッションに送信（一部の失敗は許容）
    async fn broadcast_all(&self, content: &str);

    /// セッションのクローズを要求
    async fn close(&self, session: &SessionId) -> Result<(), MessagePushError>;
}
