//! Message Router: typed transport events in, use case calls out.
//!
//! The WebSocket handler turns socket activity into [`TransportEvent`]s and
//! hands each one to [`MessageRouter::handle`]. The router parses the wire
//! format, converts it to domain values and builds the outgoing JSON; the use
//! cases only see domain values and pre-serialized messages.

use std::{net::IpAddr, sync::Arc};

use kakehashi_shared::time::{Clock, timestamp_to_rfc3339};
use thiserror::Error;

use crate::{
    domain::{ParticipantId, PusherChannel, SessionId, ValueObjectError},
    infrastructure::dto::{
        conversion::user_list_message,
        websocket::{ClientMessage, ServerMessage},
    },
    usecase::{
        ConnectSessionUseCase, DisconnectParticipantUseCase, JoinError, JoinParticipantUseCase,
        RelayMessageUseCase, RelayOutcome,
    },
};

/// Something that happened on one transport session.
#[derive(Debug)]
pub enum TransportEvent {
    /// A WebSocket connection was accepted
    Connected {
        session: SessionId,
        address: IpAddr,
        sender: PusherChannel,
    },
    /// A text frame arrived
    Message {
        session: SessionId,
        address: IpAddr,
        text: String,
    },
    /// The connection closed, failed or was reaped
    Disconnected { session: SessionId },
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid participant id: {0}")]
    InvalidParticipantId(#[from] ValueObjectError),
    #[error("Failed to serialize outgoing message: {0}")]
    Serialize(serde_json::Error),
}

pub struct MessageRouter {
    connect_session_usecase: Arc<ConnectSessionUseCase>,
    join_participant_usecase: Arc<JoinParticipantUseCase>,
    relay_message_usecase: Arc<RelayMessageUseCase>,
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// Source of chat-message timestamps
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    pub fn new(
        connect_session_usecase: Arc<ConnectSessionUseCase>,
        join_participant_usecase: Arc<JoinParticipantUseCase>,
        relay_message_usecase: Arc<RelayMessageUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect_session_usecase,
            join_participant_usecase,
            relay_message_usecase,
            disconnect_participant_usecase,
            clock,
        }
    }

    /// Dispatch one transport event.
    ///
    /// Only `Message` events can fail; the caller logs the error and keeps
    /// the connection open.
    pub async fn handle(&self, event: TransportEvent) -> Result<(), RouterError> {
        match event {
            TransportEvent::Connected {
                session,
                address,
                sender,
            } => {
                tracing::info!("Session {} connected from {}", session, address);
                self.connect_session_usecase.execute(session, sender).await;
                Ok(())
            }
            TransportEvent::Message {
                session,
                address,
                text,
            } => self.on_message(session, address, &text).await,
            TransportEvent::Disconnected { session } => {
                self.on_disconnected(session).await;
                Ok(())
            }
        }
    }

    async fn on_message(
        &self,
        session: SessionId,
        address: IpAddr,
        text: &str,
    ) -> Result<(), RouterError> {
        match ClientMessage::from_json(text)? {
            ClientMessage::Join { id } => {
                let id = ParticipantId::try_from(id)?;
                self.on_join(id, session, address).await
            }
            ClientMessage::Offer {
                target,
                from,
                offer,
            } => {
                let forward = ServerMessage::Offer {
                    offer,
                    from: from.clone(),
                };
                self.relay(from, target, forward).await
            }
            ClientMessage::Answer {
                target,
                from,
                answer,
            } => {
                let forward = ServerMessage::Answer {
                    answer,
                    from: from.clone(),
                };
                self.relay(from, target, forward).await
            }
            ClientMessage::IceCandidate {
                target,
                from,
                candidate,
            } => {
                let forward = ServerMessage::IceCandidate {
                    candidate,
                    from: from.clone(),
                };
                self.relay(from, target, forward).await
            }
            ClientMessage::ChatMessage {
                target,
                from,
                message,
            } => {
                let forward = ServerMessage::ChatMessage {
                    message,
                    from: from.clone(),
                    timestamp: timestamp_to_rfc3339(self.clock.now_millis()),
                };
                self.relay(from, target, forward).await
            }
        }
    }

    async fn on_join(
        &self,
        id: ParticipantId,
        session: SessionId,
        address: IpAddr,
    ) -> Result<(), RouterError> {
        let usecase = &self.join_participant_usecase;
        match usecase.execute(id.clone(), session, address).await {
            Ok(update) => {
                tracing::info!("Participant '{}' joined (session {})", id, session);
                let json = user_list_message(update.ids().to_vec())
                    .to_json()
                    .map_err(RouterError::Serialize)?;
                usecase.broadcast_participant_list(update, &json).await;
            }
            Err(e @ JoinError::RateLimited) => {
                tracing::warn!("Rejected join of '{}' from {}: {}", id, address, e);
                let json = ServerMessage::Error {
                    message: e.to_string(),
                }
                .to_json()
                .map_err(RouterError::Serialize)?;
                usecase.reject(&session, &json).await;
            }
        }
        Ok(())
    }

    /// Forward `forward` to `target`. The `from` string is passed through
    /// verbatim; it is only used as an id to record activity.
    async fn relay(
        &self,
        from: String,
        target: String,
        forward: ServerMessage,
    ) -> Result<(), RouterError> {
        // An id that can never be registered cannot be resolved either
        let Ok(target) = ParticipantId::try_from(target.as_str()) else {
            tracing::debug!("Relay target '{}' is not a valid id, dropping", target);
            return Ok(());
        };
        let sender = ParticipantId::try_from(from.as_str()).ok();
        let json = forward.to_json().map_err(RouterError::Serialize)?;

        if self
            .relay_message_usecase
            .execute(sender.as_ref(), &target, &json)
            .await
            == RelayOutcome::Delivered
        {
            tracing::debug!("Relayed message from '{}' to '{}'", from, target);
        }
        Ok(())
    }

    async fn on_disconnected(&self, session: SessionId) {
        tracing::info!("Session {} disconnected", session);
        let usecase = &self.disconnect_participant_usecase;
        let Some(remaining) = usecase.execute(session).await else {
            return;
        };
        match user_list_message(remaining.ids().to_vec()).to_json() {
            Ok(json) => usecase.broadcast_participant_list(remaining, &json).await,
            Err(e) => tracing::error!("Failed to serialize participant list: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            MessagePusher, MockRateLimiter, OutboundFrame, Participant, ParticipantRegistry,
            RateLimiter, Timestamp,
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryParticipantRegistry,
        },
        usecase::PresenceGate,
    };
    use async_trait::async_trait;
    use kakehashi_shared::time::ManualClock;
    use serde_json::{Value, json};
    use std::{
        net::Ipv4Addr,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };
    use tokio::sync::mpsc;

    const ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));

    struct Fixture {
        router: MessageRouter,
        registry: Arc<InMemoryParticipantRegistry>,
    }

    fn create_router(limited: bool) -> Fixture {
        let clock = Arc::new(ManualClock::new(1_704_067_200_000));
        let registry = Arc::new(InMemoryParticipantRegistry::new(clock.clone()));
        let router = build_router(registry.clone(), limited, clock);
        Fixture { router, registry }
    }

    fn build_router(
        registry: Arc<dyn ParticipantRegistry>,
        limited: bool,
        clock: Arc<ManualClock>,
    ) -> MessageRouter {
        let pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let mut limiter = MockRateLimiter::new();
        limiter.expect_should_limit().return_const(limited);
        let limiter: Arc<dyn RateLimiter> = Arc::new(limiter);
        let presence = PresenceGate::new();

        MessageRouter::new(
            Arc::new(ConnectSessionUseCase::new(pusher.clone())),
            Arc::new(JoinParticipantUseCase::new(
                registry.clone(),
                limiter,
                pusher.clone(),
                presence.clone(),
            )),
            Arc::new(RelayMessageUseCase::new(registry.clone(), pusher.clone())),
            Arc::new(DisconnectParticipantUseCase::new(registry, pusher, presence)),
            clock,
        )
    }

    /// Registry whose first `all_ids` call returns its result late, so a
    /// concurrent join can register and broadcast in between.
    struct SlowFirstListRegistry {
        inner: InMemoryParticipantRegistry,
        delayed: AtomicBool,
    }

    #[async_trait]
    impl ParticipantRegistry for SlowFirstListRegistry {
        async fn register(&self, id: ParticipantId, session: SessionId) {
            self.inner.register(id, session).await
        }
        async fn touch(&self, id: &ParticipantId) {
            self.inner.touch(id).await
        }
        async fn resolve(&self, id: &ParticipantId) -> Option<SessionId> {
            self.inner.resolve(id).await
        }
        async fn remove_by_session(&self, session: &SessionId) -> Option<ParticipantId> {
            self.inner.remove_by_session(session).await
        }
        async fn remove_by_id(&self, id: &ParticipantId) -> Option<Participant> {
            self.inner.remove_by_id(id).await
        }
        async fn remove_if_idle(
            &self,
            id: &ParticipantId,
            cutoff: Timestamp,
        ) -> Option<Participant> {
            self.inner.remove_if_idle(id, cutoff).await
        }
        async fn all_ids(&self) -> Vec<ParticipantId> {
            let ids = self.inner.all_ids().await;
            if !self.delayed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            ids
        }
        async fn snapshot(&self) -> Vec<Participant> {
            self.inner.snapshot().await
        }
    }

    async fn connect(
        router: &MessageRouter,
    ) -> (SessionId, mpsc::UnboundedReceiver<OutboundFrame>) {
        let session = SessionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        router
            .handle(TransportEvent::Connected {
                session,
                address: ADDRESS,
                sender: tx,
            })
            .await
            .unwrap();
        (session, rx)
    }

    async fn send(router: &MessageRouter, session: SessionId, message: Value) {
        router
            .handle(TransportEvent::Message {
                session,
                address: ADDRESS,
                text: message.to_string(),
            })
            .await
            .unwrap();
    }

    fn next_json(rx: &mut mpsc::UnboundedReceiver<OutboundFrame>) -> Option<Value> {
        match rx.try_recv().ok()? {
            OutboundFrame::Text(text) => serde_json::from_str(&text).ok(),
            OutboundFrame::Close => None,
        }
    }

    #[tokio::test]
    async fn test_join_broadcasts_user_list_to_every_session() {
        // テスト項目: join すると接続中の全セッション（未 join を含む）に userList が届く
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        let (_lurker, mut lurker_rx) = connect(&fixture.router).await;

        // when (操作):
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;

        // then (期待する結果):
        let expected = json!({"type": "userList", "users": ["alice"]});
        assert_eq!(next_json(&mut alice_rx), Some(expected.clone()));
        assert_eq!(next_json(&mut lurker_rx), Some(expected));
    }

    #[tokio::test]
    async fn test_rate_limited_join_gets_error_only() {
        // テスト項目: レート制限された join は送信元にだけ error が返り、登録されない
        // given (前提条件):
        let fixture = create_router(true);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        let (_other, mut other_rx) = connect(&fixture.router).await;

        // when (操作):
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;

        // then (期待する結果):
        let error = next_json(&mut alice_rx).unwrap();
        assert_eq!(error["type"], "error");
        assert!(error["message"].is_string());
        assert_eq!(next_json(&mut other_rx), None);
        assert!(fixture.registry.all_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_offer_is_forwarded_to_target_only() {
        // テスト項目: offer は宛先にだけ、target を除いた形で転送される
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        let (bob, mut bob_rx) = connect(&fixture.router).await;
        let (carol, mut carol_rx) = connect(&fixture.router).await;
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;
        send(&fixture.router, bob, json!({"type": "join", "id": "bob"})).await;
        send(&fixture.router, carol, json!({"type": "join", "id": "carol"})).await;
        for rx in [&mut alice_rx, &mut bob_rx, &mut carol_rx] {
            while rx.try_recv().is_ok() {}
        }

        // when (操作):
        let offer = json!({"type": "offer", "sdp": "v=0\r\n"});
        send(
            &fixture.router,
            alice,
            json!({"type": "offer", "target": "bob", "from": "alice", "offer": offer}),
        )
        .await;

        // then (期待する結果):
        assert_eq!(
            next_json(&mut bob_rx),
            Some(json!({"type": "offer", "offer": offer, "from": "alice"}))
        );
        assert_eq!(next_json(&mut alice_rx), None);
        assert_eq!(next_json(&mut carol_rx), None);
    }

    #[tokio::test]
    async fn test_chat_message_is_stamped_by_server() {
        // テスト項目: chat-message にはサーバー側の時刻（UTC, ミリ秒, Z）が付与される
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, _alice_rx) = connect(&fixture.router).await;
        let (bob, mut bob_rx) = connect(&fixture.router).await;
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;
        send(&fixture.router, bob, json!({"type": "join", "id": "bob"})).await;
        while bob_rx.try_recv().is_ok() {}

        // when (操作):
        send(
            &fixture.router,
            alice,
            json!({"type": "chat-message", "target": "bob", "from": "alice", "message": "hi"}),
        )
        .await;

        // then (期待する結果):
        assert_eq!(
            next_json(&mut bob_rx),
            Some(json!({
                "type": "chat-message",
                "message": "hi",
                "from": "alice",
                "timestamp": "2024-01-01T00:00:00.000Z"
            }))
        );
    }

    #[tokio::test]
    async fn test_unknown_target_is_silently_dropped() {
        // テスト項目: 未登録の宛先へのメッセージはエラーにならず、誰にも届かない
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;
        while alice_rx.try_recv().is_ok() {}

        // when (操作):
        let result = fixture
            .router
            .handle(TransportEvent::Message {
                session: alice,
                address: ADDRESS,
                text: json!({"type": "answer", "target": "ghost", "from": "alice", "answer": {}})
                    .to_string(),
            })
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(next_json(&mut alice_rx), None);
    }

    #[tokio::test]
    async fn test_malformed_message_is_an_error() {
        // テスト項目: 不正なメッセージは RouterError になり、状態は変わらない
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, _alice_rx) = connect(&fixture.router).await;

        // when (操作):
        let not_json = fixture
            .router
            .handle(TransportEvent::Message {
                session: alice,
                address: ADDRESS,
                text: "not json".to_string(),
            })
            .await;
        let empty_id = fixture
            .router
            .handle(TransportEvent::Message {
                session: alice,
                address: ADDRESS,
                text: json!({"type": "join", "id": ""}).to_string(),
            })
            .await;

        // then (期待する結果):
        assert!(matches!(not_json, Err(RouterError::Malformed(_))));
        assert!(matches!(
            empty_id,
            Err(RouterError::InvalidParticipantId(_))
        ));
        assert!(fixture.registry.all_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_rebroadcasts_user_list() {
        // テスト項目: join 済みセッションが切断すると残りのセッションに userList が届く
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        let (bob, _bob_rx) = connect(&fixture.router).await;
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;
        send(&fixture.router, bob, json!({"type": "join", "id": "bob"})).await;
        while alice_rx.try_recv().is_ok() {}

        // when (操作):
        fixture
            .router
            .handle(TransportEvent::Disconnected { session: bob })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            next_json(&mut alice_rx),
            Some(json!({"type": "userList", "users": ["alice"]}))
        );
        let bob_id = ParticipantId::try_from("bob").unwrap();
        assert_eq!(fixture.registry.resolve(&bob_id).await, None);
    }

    #[tokio::test]
    async fn test_disconnect_without_join_sends_nothing() {
        // テスト項目: join していないセッションの切断では userList を再送しない
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        let (lurker, _lurker_rx) = connect(&fixture.router).await;
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;
        while alice_rx.try_recv().is_ok() {}

        // when (操作):
        fixture
            .router
            .handle(TransportEvent::Disconnected { session: lurker })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(next_json(&mut alice_rx), None);
    }

    #[tokio::test]
    async fn test_concurrent_joins_broadcast_latest_list_last() {
        // テスト項目: join が並行しても、最後に届く userList は最新の参加者一覧になる
        // given (前提条件): 最初の一覧取得だけが遅れるレジストリ
        let clock = Arc::new(ManualClock::new(1_704_067_200_000));
        let registry = Arc::new(SlowFirstListRegistry {
            inner: InMemoryParticipantRegistry::new(clock.clone()),
            delayed: AtomicBool::new(false),
        });
        let router = build_router(registry.clone(), false, clock);
        let (a, _a_rx) = connect(&router).await;
        let (b, _b_rx) = connect(&router).await;
        let (_observer, mut observer_rx) = connect(&router).await;

        // when (操作):
        tokio::join!(
            send(&router, a, json!({"type": "join", "id": "A"})),
            send(&router, b, json!({"type": "join", "id": "B"})),
        );

        // then (期待する結果):
        let mut last = None;
        while let Some(message) = next_json(&mut observer_rx) {
            last = Some(message);
        }
        assert_eq!(registry.inner.all_ids().await.len(), 2);
        assert_eq!(last, Some(json!({"type": "userList", "users": ["A", "B"]})));
    }

    #[tokio::test]
    async fn test_invalid_sender_id_is_still_forwarded() {
        // テスト項目: from が ID として不正でも、宛先には from をそのまま付けて転送される
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, _alice_rx) = connect(&fixture.router).await;
        let (bob, mut bob_rx) = connect(&fixture.router).await;
        send(&fixture.router, bob, json!({"type": "join", "id": "bob"})).await;
        while bob_rx.try_recv().is_ok() {}

        // when (操作):
        let result = fixture
            .router
            .handle(TransportEvent::Message {
                session: alice,
                address: ADDRESS,
                text: json!({"type": "offer", "target": "bob", "from": "", "offer": "X"})
                    .to_string(),
            })
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(
            next_json(&mut bob_rx),
            Some(json!({"type": "offer", "offer": "X", "from": ""}))
        );
    }

    #[tokio::test]
    async fn test_invalid_target_id_is_silently_dropped() {
        // テスト項目: 登録できない長さの宛先はエラーにならず、誰にも届かない
        // given (前提条件):
        let fixture = create_router(false);
        let (alice, mut alice_rx) = connect(&fixture.router).await;
        send(&fixture.router, alice, json!({"type": "join", "id": "alice"})).await;
        while alice_rx.try_recv().is_ok() {}

        // when (操作):
        let result = fixture
            .router
            .handle(TransportEvent::Message {
                session: alice,
                address: ADDRESS,
                text: json!({
                    "type": "chat-message",
                    "target": "x".repeat(300),
                    "from": "alice",
                    "message": "hi"
                })
                .to_string(),
            })
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(next_json(&mut alice_rx), None);
    }
}
