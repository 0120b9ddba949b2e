//! Repository trait 定義
//!
//! ドメイン層が必要とする参加者レジストリのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Participant, ParticipantId, SessionId, Timestamp};

/// Participant Registry trait
///
/// 参加者 ID とトランスポートセッションの対応表。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// ## 不変条件
///
/// - 1 つの ID に対して登録されるエントリは常に 1 つ（後勝ち）
/// - 1 つのセッションが保持する ID は常に 1 つ
/// - 各操作はアトミックに実行される
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantRegistry: Send + Sync {
    /// 参加者を登録（既存の ID は上書き）
    ///
    /// 上書きされた以前のセッションはクローズしない。
    async fn register(&self, id: ParticipantId, session: SessionId);

    /// 最終アクティビティ時刻を更新（未登録なら何もしない）
    async fn touch(&self, id: &ParticipantId);

    /// ID から現在のセッションを引く
    async fn resolve(&self, id: &ParticipantId) -> Option<SessionId>;

    /// セッションから参加者を削除し、削除した ID を返す
    async fn remove_by_session(&self, session: &SessionId) -> Option<ParticipantId>;

    /// ID から参加者を削除し、削除したエントリを返す
    async fn remove_by_id(&self, id: &ParticipantId) -> Option<Participant>;

    /// `cutoff` より前からアクティビティがない場合に限り、ID から参加者を削除する
    ///
    /// 判定と削除は同じロックの中で行うため、スナップショット取得後に
    /// 再 join や touch があったエントリは削除されない。
    async fn remove_if_idle(&self, id: &ParticipantId, cutoff: Timestamp) -> Option<Participant>;

    /// 登録中の全ての ID（登録順）
    async fn all_ids(&self) -> Vec<ParticipantId>;

    /// 登録中の全てのエントリのコピー（登録順）
    async fn snapshot(&self) -> Vec<Participant>;
}
