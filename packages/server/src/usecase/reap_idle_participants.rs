//! UseCase: アイドル参加者の削除
//!
//! 一定時間メッセージを中継していない参加者をレジストリから削除し、
//! そのセッションのクローズを要求します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReapIdleParticipantsUseCase::execute() メソッド
//! - アイドル判定（last_activity_at < now - idle_timeout）
//!
//! ### なぜこのテストが必要か
//! - アクティブな参加者が削除されないことを保証
//! - 削除した参加者のセッションにだけクローズが要求されることを保証
//! - 削除がなければ userList を再送しない（結果が None）ことを確認
//! - スナップショット後に再 join した参加者が削除されないことを確認

use std::{sync::Arc, time::Duration};

use kakehashi_shared::time::Clock;

use crate::domain::{MessagePusher, ParticipantId, ParticipantRegistry, Timestamp};

use super::presence::{PresenceGate, PresenceUpdate};

/// 1 回の削除処理の結果（削除があった場合のみ）
#[derive(Debug)]
pub struct ReapReport {
    /// 削除した参加者 ID
    pub evicted: Vec<ParticipantId>,
    /// 削除後に残っている参加者 ID（登録順）
    pub remaining: PresenceUpdate,
}

/// アイドル参加者削除のユースケース
pub struct ReapIdleParticipantsUseCase {
    /// ParticipantRegistry（参加者 ID とセッションの対応表）
    registry: Arc<dyn ParticipantRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 現在時刻
    clock: Arc<dyn Clock>,
    /// 参加者一覧の変更を直列化するゲート
    presence: PresenceGate,
}

impl ReapIdleParticipantsUseCase {
    /// 新しい ReapIdleParticipantsUseCase を作成
    pub fn new(
        registry: Arc<dyn ParticipantRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        presence: PresenceGate,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            clock,
            presence,
        }
    }

    /// アイドル参加者の削除を実行
    ///
    /// レジストリのスナップショットから対象を選び、1 件ずつ削除する。
    /// 削除の直前にアイドル判定をやり直すため、スナップショット後に再 join や
    /// 中継があった参加者は残る。削除後の close 通知はレジストリに該当がないため何もしない。
    ///
    /// # Arguments
    ///
    /// * `idle_timeout` - この時間より長くアクティビティがない参加者を削除する
    ///
    /// # Returns
    ///
    /// 削除がなければ `None`
    pub async fn execute(&self, idle_timeout: Duration) -> Option<ReapReport> {
        let timeout_millis = i64::try_from(idle_timeout.as_millis()).unwrap_or(i64::MAX);
        let cutoff = Timestamp::new(self.clock.now_millis().saturating_sub(timeout_millis));

        // 1. スナップショットから対象を選ぶ（ロックはコピーの間だけ）
        let idle: Vec<ParticipantId> = self
            .registry
            .snapshot()
            .await
            .into_iter()
            .filter(|participant| participant.is_idle_since(cutoff))
            .map(|participant| participant.id)
            .collect();

        if idle.is_empty() {
            return None;
        }

        // 2. 1 件ずつ削除し、削除したセッションのクローズを要求
        let guard = self.presence.enter().await;
        let mut evicted = Vec::with_capacity(idle.len());
        for id in idle {
            let Some(removed) = self.registry.remove_if_idle(&id, cutoff).await else {
                continue;
            };
            if let Err(e) = self.message_pusher.close(&removed.session).await {
                tracing::debug!("Failed to close idle session {}: {}", removed.session, e);
            }
            tracing::info!("Evicted idle participant '{}'", removed.id);
            evicted.push(removed.id);
        }

        if evicted.is_empty() {
            return None;
        }

        Some(ReapReport {
            evicted,
            remaining: PresenceUpdate::new(self.registry.all_ids().await, guard),
        })
    }

    /// 参加者リストを接続中の全セッションにブロードキャストし、ゲートを開ける
    ///
    /// # Arguments
    ///
    /// * `update` - `execute` が返した残りの参加者一覧
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_participant_list(&self, update: PresenceUpdate, message: &str) {
        self.message_pusher.broadcast_all(message).await;
        drop(update);
    }
}
