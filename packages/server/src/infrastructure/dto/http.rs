//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /health` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    /// Seconds since the server started
    pub uptime: f64,
}

impl HealthDto {
    pub fn ok(uptime: f64) -> Self {
        Self {
            status: "ok".to_string(),
            uptime,
        }
    }
}

/// `GET /api/participants` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantsDto {
    pub participants: Vec<ParticipantDetailDto>,
}

/// One registered participant (timestamps in RFC 3339, UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDetailDto {
    pub id: String,
    pub joined_at: String,
    pub last_activity_at: String,
}
