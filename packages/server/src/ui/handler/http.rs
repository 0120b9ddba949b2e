//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{HealthDto, ParticipantsDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto::ok(state.started_at.elapsed().as_secs_f64()))
}

/// Get registered participants in presence order
pub async fn list_participants(State(state): State<Arc<AppState>>) -> Json<ParticipantsDto> {
    let participants = state.list_participants_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(participants.into())
}
