//! UseCase: セッション接続処理
//!
//! WebSocket 接続が確立した時点で送信チャンネルを登録します。
//! join 前のセッションも userList のブロードキャストを受け取れるようにするためです。

use std::sync::Arc;

use crate::domain::{MessagePusher, PusherChannel, SessionId};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// セッション接続を実行
    ///
    /// # Arguments
    ///
    /// * `session` - 接続したセッションの ID
    /// * `sender` - セッションへのメッセージ送信用チャンネル
    pub async fn execute(&self, session: SessionId, sender: PusherChannel) {
        self.message_pusher.register_session(session, sender).await;
    }
}
