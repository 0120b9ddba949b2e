//! InMemory Participant Registry 実装
//!
//! ドメイン層が定義する ParticipantRegistry trait の具体的な実装。
//! ID → エントリ、セッション → ID の 2 つの HashMap を 1 つの Mutex で保護し、
//! 全ての操作で両者を同期させます。
//!
//! ## 表示順
//!
//! 参加者一覧は登録順で返します。登録ごとに連番を振り、同じ ID の上書きでは
//! 連番を引き継ぐため、上書きされた参加者は一覧上の位置を保ちます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use kakehashi_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{Participant, ParticipantId, ParticipantRegistry, SessionId, Timestamp};

struct RegistryEntry {
    participant: Participant,
    seq: u64,
}

#[derive(Default)]
struct RegistryState {
    by_id: HashMap<ParticipantId, RegistryEntry>,
    by_session: HashMap<SessionId, ParticipantId>,
    next_seq: u64,
}

impl RegistryState {
    fn ordered(&self) -> Vec<&RegistryEntry> {
        let mut entries: Vec<&RegistryEntry> = self.by_id.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }
}

/// インメモリ Participant Registry 実装
pub struct InMemoryParticipantRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryParticipantRegistry {
    /// 新しい InMemoryParticipantRegistry を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl ParticipantRegistry for InMemoryParticipantRegistry {
    async fn register(&self, id: ParticipantId, session: SessionId) {
        let now = self.now();
        let mut state = self.state.lock().await;

        // A session holds at most one id: re-joining under a new id drops the old one.
        if let Some(previous_id) = state.by_session.get(&session).cloned()
            && previous_id != id
        {
            state.by_id.remove(&previous_id);
            tracing::debug!(
                "Session {} switched from '{}' to '{}'",
                session,
                previous_id,
                id
            );
        }

        let existing = state
            .by_id
            .get(&id)
            .map(|entry| (entry.participant.session, entry.seq));
        let seq = match existing {
            Some((previous_session, seq)) => {
                if previous_session != session {
                    // The superseded session stays open but no longer owns this id.
                    state.by_session.remove(&previous_session);
                    tracing::debug!(
                        "Participant '{}' rebound from session {} to {}",
                        id,
                        previous_session,
                        session
                    );
                }
                seq
            }
            None => {
                let seq = state.next_seq;
                state.next_seq += 1;
                seq
            }
        };

        state.by_session.insert(session, id.clone());
        state.by_id.insert(
            id.clone(),
            RegistryEntry {
                participant: Participant::new(id, session, now),
                seq,
            },
        );
    }

    async fn touch(&self, id: &ParticipantId) {
        let now = self.now();
        let mut state = self.state.lock().await;
        if let Some(entry) = state.by_id.get_mut(id) {
            entry.participant.touch(now);
        }
    }

    async fn resolve(&self, id: &ParticipantId) -> Option<SessionId> {
        let state = self.state.lock().await;
        state.by_id.get(id).map(|entry| entry.participant.session)
    }

    async fn remove_by_session(&self, session: &SessionId) -> Option<ParticipantId> {
        let mut state = self.state.lock().await;
        let id = state.by_session.remove(session)?;
        state.by_id.remove(&id);
        Some(id)
    }

    async fn remove_by_id(&self, id: &ParticipantId) -> Option<Participant> {
        let mut state = self.state.lock().await;
        let entry = state.by_id.remove(id)?;
        state.by_session.remove(&entry.participant.session);
        Some(entry.participant)
    }

    async fn remove_if_idle(&self, id: &ParticipantId, cutoff: Timestamp) -> Option<Participant> {
        let mut state = self.state.lock().await;
        if !state.by_id.get(id)?.participant.is_idle_since(cutoff) {
            return None;
        }
        let entry = state.by_id.remove(id)?;
        state.by_session.remove(&entry.participant.session);
        Some(entry.participant)
    }

    async fn all_ids(&self) -> Vec<ParticipantId> {
        let state = self.state.lock().await;
        state
            .ordered()
            .into_iter()
            .map(|entry| entry.participant.id.clone())
            .collect()
    }

    async fn snapshot(&self) -> Vec<Participant> {
        let state = self.state.lock().await;
        state
            .ordered()
            .into_iter()
            .map(|entry| entry.participant.clone())
            .collect()
    }
}
