//! Conversion logic from domain entities to DTOs.

use kakehashi_shared::time::timestamp_to_rfc3339;

use crate::domain::{Participant, ParticipantId};
use crate::infrastructure::dto::{
    http::{ParticipantDetailDto, ParticipantsDto},
    websocket::ServerMessage,
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Participant> for ParticipantDetailDto {
    fn from(model: Participant) -> Self {
        Self {
            id: model.id.into_string(),
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
            last_activity_at: timestamp_to_rfc3339(model.last_activity_at.value()),
        }
    }
}

impl From<Vec<Participant>> for ParticipantsDto {
    fn from(models: Vec<Participant>) -> Self {
        Self {
            participants: models.into_iter().map(Into::into).collect(),
        }
    }
}

/// Build the `userList` broadcast from registry ids (order preserved).
pub fn user_list_message(ids: Vec<ParticipantId>) -> ServerMessage {
    ServerMessage::UserList {
        users: ids.into_iter().map(ParticipantId::into_string).collect(),
    }
}
