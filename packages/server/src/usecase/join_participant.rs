//! UseCase: 参加者登録（join）処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinParticipantUseCase::execute() メソッド
//! - レート制限の判定と、参加者レジストリへの登録
//!
//! ### なぜこのテストが必要か
//! - レート制限を超えた join が登録されないことを保証
//! - 同じ ID の再登録は後勝ちであることを保証
//! - 登録後の参加者リスト（userList の元）が正しく返されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の登録
//! - 異常系：レート制限超過
//! - エッジケース：同じ ID での再登録、同じセッションでの別 ID への再登録

use std::{net::IpAddr, sync::Arc};

use crate::domain::{MessagePusher, ParticipantId, ParticipantRegistry, RateLimiter, SessionId};

use super::{
    error::JoinError,
    presence::{PresenceGate, PresenceUpdate},
};

/// 参加者登録のユースケース
pub struct JoinParticipantUseCase {
    /// ParticipantRegistry（参加者 ID とセッションの対応表）
    registry: Arc<dyn ParticipantRegistry>,
    /// RateLimiter（送信元アドレスごとのリクエスト数制限）
    rate_limiter: Arc<dyn RateLimiter>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 参加者一覧の変更を直列化するゲート
    presence: PresenceGate,
}

impl JoinParticipantUseCase {
    /// 新しい JoinParticipantUseCase を作成
    pub fn new(
        registry: Arc<dyn ParticipantRegistry>,
        rate_limiter: Arc<dyn RateLimiter>,
        message_pusher: Arc<dyn MessagePusher>,
        presence: PresenceGate,
    ) -> Self {
        Self {
            registry,
            rate_limiter,
            message_pusher,
            presence,
        }
    }

    /// 参加者登録を実行
    ///
    /// # Arguments
    ///
    /// * `id` - 登録する参加者 ID
    /// * `session` - join を送ってきたセッション
    /// * `address` - 送信元アドレス（レート制限のキー）
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceUpdate)` - 登録後の全参加者 ID（登録順）。
    ///   [`Self::broadcast_participant_list`] に渡すまでゲートを保持する
    /// * `Err(JoinError::RateLimited)` - レート制限超過（登録しない）
    pub async fn execute(
        &self,
        id: ParticipantId,
        session: SessionId,
        address: IpAddr,
    ) -> Result<PresenceUpdate, JoinError> {
        // 1. レート制限
        if self.rate_limiter.should_limit(address).await {
            return Err(JoinError::RateLimited);
        }

        // 2. Registry に登録（同じ ID は後勝ち）
        let guard = self.presence.enter().await;
        self.registry.register(id, session).await;

        // 3. 最新の参加者リストを返す
        Ok(PresenceUpdate::new(self.registry.all_ids().await, guard))
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

    /// join を拒否したセッションにだけエラーを通知
    ///
    /// # Arguments
    ///
    /// * `session` - 通知先のセッション
    /// * `message` - エラーメッセージ（JSON）
    pub async fn reject(&self, session: &SessionId, message: &str) {
        if let Err(e) = self.message_pusher.push_to(session, message).await {
            tracing::warn!("Failed to notify session {} of rejection: {}", session, e);
        }
    }
}
