//! UseCase: シグナリングメッセージの中継
//!
//! offer / answer / ice-candidate / chat-message を宛先の参加者 1 人にだけ転送します。
//! ペイロードの中身は検査しません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayMessageUseCase::execute() メソッド
//! - 宛先の解決と、送信元のアクティビティ更新
//!
//! ### なぜこのテストが必要か
//! - 宛先以外のセッションに転送されないことを保証
//! - 宛先が存在しない場合は何も送らずに破棄されることを保証
//! - アイドル判定の元になる last_activity_at が更新されることを確認

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantId, ParticipantRegistry};

/// 中継の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// 宛先のセッションに送信した
    Delivered,
    /// 宛先が見つからない、または送信に失敗したため破棄した
    Dropped,
}

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    /// ParticipantRegistry（参加者 ID とセッションの対応表）
    registry: Arc<dyn ParticipantRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayMessageUseCase {
    /// 新しい RelayMessageUseCase を作成
    pub fn new(
        registry: Arc<dyn ParticipantRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// メッセージ中継を実行
    ///
    /// # Arguments
    ///
    /// * `from` - 送信元の参加者 ID（アクティビティを更新する）。ID として不正なら `None`
    /// * `target` - 宛先の参加者 ID
    /// * `message` - 転送するメッセージ（JSON）
    ///
    /// 送信元が登録されていなくても宛先への転送は行う。
    pub async fn execute(
        &self,
        from: Option<&ParticipantId>,
        target: &ParticipantId,
        message: &str,
    ) -> RelayOutcome {
        // 1. 送信元のアクティビティを更新（best-effort）
        if let Some(from) = from {
            self.registry.touch(from).await;
        }

        // 2. 宛先を解決
        let Some(session) = self.registry.resolve(target).await else {
            tracing::debug!("Relay target '{}' is not registered, dropping", target);
            return RelayOutcome::Dropped;
        };

        // 3. 宛先のセッションにだけ送信
        match self.message_pusher.push_to(&session, message).await {
            Ok(()) => RelayOutcome::Delivered,
            Err(e) => {
                tracing::debug!("Failed to relay message to '{}': {}", target, e);
                RelayOutcome::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessagePushError, MockMessagePusher, SessionId},
        infrastructure::repository::InMemoryParticipantRegistry,
    };
    use kakehashi_shared::time::ManualClock;
    use std::time::Duration;

    fn id(value: &str) -> ParticipantId {
        ParticipantId::try_from(value).unwrap()
    }

    fn create_test_registry() -> (Arc<InMemoryParticipantRegistry>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let registry = Arc::new(InMemoryParticipantRegistry::new(clock.clone()));
        (registry, clock)
    }

    #[tokio::test]
    async fn test_execute_delivers_only_to_target() {
        // テスト項目: 宛先のセッションにだけ転送される
        // given (前提条件):
        let (registry, _clock) = create_test_registry();
        let alice = SessionId::generate();
        let bob = SessionId::generate();
        registry.register(id("alice"), alice).await;
        registry.register(id("bob"), bob).await;

        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf(move |session, content| *session == bob && content == "payload")
            .times(1)
            .returning(|_, _| Ok(()));
        pusher.expect_broadcast_all().never();
        let usecase = RelayMessageUseCase::new(registry, Arc::new(pusher));

        // when (操作):
        let outcome = usecase.execute(Some(&id("alice")), &id("bob"), "payload").await;

        // then (期待する結果):
        assert_eq!(outcome, RelayOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_execute_unknown_target_is_dropped() {
        // テスト項目: 宛先が未登録なら何も送らずに破棄される
        // given (前提条件):
        let (registry, _clock) = create_test_registry();
        registry.register(id("alice"), SessionId::generate()).await;

        let mut pusher = MockMessagePusher::new();
        pusher.expect_push_to().never();
        let usecase = RelayMessageUseCase::new(registry, Arc::new(pusher));

        // when (操作):
        let outcome = usecase.execute(Some(&id("alice")), &id("ghost"), "payload").await;

        // then (期待する結果):
        assert_eq!(outcome, RelayOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_execute_touches_sender() {
        // テスト項目: 中継時に送信元の last_activity_at が更新される
        // given (前提条件):
        let (registry, clock) = create_test_registry();
        registry.register(id("alice"), SessionId::generate()).await;
        registry.register(id("bob"), SessionId::generate()).await;

        let mut pusher = MockMessagePusher::new();
        pusher.expect_push_to().returning(|_, _| Ok(()));
        let usecase = RelayMessageUseCase::new(registry.clone(), Arc::new(pusher));

        // when (操作):
        clock.advance(Duration::from_secs(10));
        usecase.execute(Some(&id("alice")), &id("bob"), "payload").await;

        // then (期待する結果):
        let snapshot = registry.snapshot().await;
        let alice = snapshot.iter().find(|p| p.id == id("alice")).unwrap();
        let bob = snapshot.iter().find(|p| p.id == id("bob")).unwrap();
        assert_eq!(alice.last_activity_at.value(), 10_000);
        assert_eq!(bob.last_activity_at.value(), 0);
    }

    #[tokio::test]
    async fn test_execute_push_failure_is_dropped() {
        // テスト項目: 送信に失敗しても呼び出し元にはエラーを返さない
        // given (前提条件):
        let (registry, _clock) = create_test_registry();
        registry.register(id("bob"), SessionId::generate()).await;

        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .returning(|_, _| Err(MessagePushError::PushFailed("closed".to_string())));
        let usecase = RelayMessageUseCase::new(registry, Arc::new(pusher));

        // when (操作):
        let outcome = usecase.execute(Some(&id("alice")), &id("bob"), "payload").await;

        // then (期待する結果):
        assert_eq!(outcome, RelayOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_execute_without_valid_sender_still_delivers() {
        // テスト項目: 送信元が不正な ID でも宛先には転送され、touch は行われない
        // given (前提条件):
        let (registry, _clock) = create_test_registry();
        let bob = SessionId::generate();
        registry.register(id("bob"), bob).await;

        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf(move |session, _| *session == bob)
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = RelayMessageUseCase::new(registry, Arc::new(pusher));

        // when (操作):
        let outcome = usecase.execute(None, &id("bob"), "payload").await;

        // then (期待する結果):
        assert_eq!(outcome, RelayOutcome::Delivered);
    }
}
