//! UseCase: 参加者一覧の取得

use std::sync::Arc;

use crate::domain::{Participant, ParticipantRegistry};

/// 参加者一覧取得のユースケース
pub struct ListParticipantsUseCase {
    /// ParticipantRegistry（参加者 ID とセッションの対応表）
    registry: Arc<dyn ParticipantRegistry>,
}

impl ListParticipantsUseCase {
    /// 新しい ListParticipantsUseCase を作成
    pub fn new(registry: Arc<dyn ParticipantRegistry>) -> Self {
        Self { registry }
    }

    /// 登録中の全参加者を登録順で返す
    pub async fn execute(&self) -> Vec<Participant> {
        self.registry.snapshot().await
    }
}
