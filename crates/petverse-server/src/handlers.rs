//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness and session count |
//! | `GET` | `/api/sessions` | Summaries of every live session |
//! | `GET` | `/api/sessions/{id}` | One session summary |
//! | `GET` | `/api/sessions/{id}/state` | Full replicated state |
//! | `DELETE` | `/api/sessions/{id}` | Flush and close a session |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use petverse_core::RoomHandle;
use petverse_types::SessionId;

use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::InvalidId(format!("{raw}: {e}")))
}

async fn live_room(state: &AppState, raw: &str) -> Result<RoomHandle, ApiError> {
    let id = parse_session_id(raw)?;
    state
        .registry
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("session {id}")))
}

/// Liveness check.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.registry.list().await.len();
    let uptime_secs = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds();
    Json(serde_json::json!({
        "status": "ok",
        "sessions": sessions,
        "uptime_secs": uptime_secs,
    }))
}

/// List every live session.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.registry.list().await;
    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// One session summary.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let room = live_room(&state, &id).await?;
    Ok(Json(room.info().await?))
}

/// Full replicated state of one session.
pub async fn get_session_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let room = live_room(&state, &id).await?;
    Ok(Json(room.full_state().await?))
}

/// Flush and close one session.
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let room = live_room(&state, &id).await?;
    room.shutdown().await?;
    state.registry.prune().await;
    Ok(StatusCode::NO_CONTENT)
}
