//! Error types for the Petverse HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use petverse_core::RoomError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested session does not exist or has closed.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path id could not be parsed.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A query parameter was missing or malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The room rejected the command.
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Room(RoomError::Closed(_)) => StatusCode::GONE,
            Self::Room(RoomError::UnknownClient(_)) => StatusCode::NOT_FOUND,
            Self::Room(RoomError::Persistence(_)) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
