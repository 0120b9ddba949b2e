//! Shared application state.

use std::{sync::Arc, time::Instant};

use crate::usecase::ListParticipantsUseCase;

use super::signaling::MessageRouter;

/// Shared application state
pub struct AppState {
    /// MessageRouter（WebSocket イベントの振り分け）
    pub message_router: Arc<MessageRouter>,
    /// ListParticipantsUseCase（参加者一覧取得のユースケース）
    pub list_participants_usecase: Arc<ListParticipantsUseCase>,
    /// サーバー起動時刻（uptime の計算用）
    pub started_at: Instant,
}
