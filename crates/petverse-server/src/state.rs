//! Shared application state for the HTTP and `WebSocket` handlers.

use chrono::{DateTime, Utc};
use petverse_core::SessionRegistry;

/// State shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live session rooms.
    pub registry: SessionRegistry,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wrap a registry.
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            registry,
            started_at: Utc::now(),
        }
    }
}
