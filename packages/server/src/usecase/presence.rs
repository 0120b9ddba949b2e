//! 参加者一覧の変更とブロードキャストの直列化
//!
//! join / 切断 / アイドル削除はそれぞれ「レジストリの変更 → ID 一覧の取得 →
//! ブロードキャスト」を行います。これらが並行に走ると古い一覧が最後に届くため、
//! 3 つの手順を [`PresenceGate`] で 1 つのクリティカルセクションにまとめます。

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ParticipantId;

/// 参加者一覧を変更する UseCase 間で共有するゲート
#[derive(Debug, Clone, Default)]
pub struct PresenceGate {
    lock: Arc<Mutex<()>>,
}

impl PresenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn enter(&self) -> OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }
}

/// 変更後の参加者一覧
///
/// ブロードキャストが終わるまでゲートを保持する。破棄するとゲートが開く。
#[derive(Debug)]
#[must_use = "dropping the update releases the presence gate without broadcasting"]
pub struct PresenceUpdate {
    ids: Vec<ParticipantId>,
    _guard: OwnedMutexGuard<()>,
}

impl PresenceUpdate {
    pub(crate) fn new(ids: Vec<ParticipantId>, guard: OwnedMutexGuard<()>) -> Self {
        Self { ids, _guard: guard }
    }

    /// 登録中の全ての ID（登録順）
    pub fn ids(&self) -> &[ParticipantId] {
        &self.ids
    }
}
