//! Axum router construction.
//!
//! Assembles the REST and `WebSocket` routes into a single [`Router`] with
//! CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /ws/sessions/{id}` -- game client `WebSocket`
/// - `GET /api/health` -- liveness
/// - `GET /api/sessions` -- list sessions
/// - `GET /api/sessions/{id}` -- one session
/// - `DELETE /api/sessions/{id}` -- close a session
/// - `GET /api/sessions/{id}/state` -- full state of one session
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/sessions/{id}", get(ws::ws_session))
        .route("/api/health", get(handlers::health))
        .route("/api/sessions", get(handlers::list_sessions))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route("/api/sessions/{id}/state", get(handlers::get_session_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
