//! UseCase 層
//!
//! 1 つの操作につき 1 つの構造体を持ちます。
//! 各 UseCase は Domain 層の trait（`ParticipantRegistry`, `RateLimiter`,
//! `MessagePusher`）にのみ依存し、メッセージの JSON 化は UI 層が行います。
//! 参加者一覧を変更する UseCase は [`PresenceGate`] を共有します。

pub mod connect_session;
pub mod disconnect_participant;
pub mod error;
pub mod join_participant;
pub mod list_participants;
pub mod presence;
pub mod reap_idle_participants;
pub mod relay_message;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::JoinError;
pub use join_participant::JoinParticipantUseCase;
pub use list_participants::ListParticipantsUseCase;
pub use presence::{PresenceGate, PresenceUpdate};
pub use reap_idle_participants::{ReapIdleParticipantsUseCase, ReapReport};
pub use relay_message::{RelayMessageUseCase, RelayOutcome};
