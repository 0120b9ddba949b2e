//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - セッション切断時の参加者削除と送信チャンネルの登録解除
//!
//! ### なぜこのテストが必要か
//! - 切断したセッションの参加者がレジストリに残らないことを保証
//! - join していないセッションの切断では userList を再送しないことを保証
//! - 上書きされた古いセッションの切断が新しい登録を消さないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：join 済みセッションの切断
//! - エッジケース：join 前のセッションの切断、上書き済みセッションの切断

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantRegistry, SessionId};

use super::presence::{PresenceGate, PresenceUpdate};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// ParticipantRegistry（参加者 ID とセッションの対応表）
    registry: Arc<dyn ParticipantRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 参加者一覧の変更を直列化するゲート
    presence: PresenceGate,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        registry: Arc<dyn ParticipantRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        presence: PresenceGate,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            presence,
        }
    }

    /// 参加者切断を実行
    ///
    /// 送信チャンネルは参加者の有無にかかわらず登録解除する。
    ///
    /// # Arguments
    ///
    /// * `session` - 切断したセッション
    ///
    /// # Returns
    ///
    /// * `Some(PresenceUpdate)` - 参加者を削除した。残りの全参加者 ID（登録順）
    /// * `None` - このセッションに紐づく参加者はいなかった
    pub async fn execute(&self, session: SessionId) -> Option<PresenceUpdate> {
        // 1. MessagePusher からセッションを登録解除
        self.message_pusher.unregister_session(&session).await;

        // 2. Registry から参加者を削除
        let guard = self.presence.enter().await;
        let removed = self.registry.remove_by_session(&session).await?;
        tracing::info!("Participant '{}' left (session {})", removed, session);

        // 3. 残りの参加者リストを返す
        Some(PresenceUpdate::new(self.registry.all_ids().await, guard))
    }

    /// 参加者リストを接続中の全セッションにブロードキャストし、ゲートを開ける
    ///
    /// # Arguments
    ///
    /// * `update` - `execute` が返した参加者一覧
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_participant_list(&self, update: PresenceUpdate, message: &str) {
        self.message_pusher.broadcast_all(message).await;
        drop(update);
    }
}
