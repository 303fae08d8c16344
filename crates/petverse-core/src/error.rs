//! Error types for the petverse-core crate.

use petverse_types::{ClientId, SessionId};

use crate::persistence::PersistenceError;

/// A room command could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room has closed and accepts no further commands.
    #[error("session {0} is closed")]
    Closed(SessionId),

    /// The client is not joined to this room.
    #[error("unknown client: {0}")]
    UnknownClient(ClientId),

    /// Player data could not be loaded on join.
    #[error("failed to load player: {0}")]
    Persistence(#[from] PersistenceError),
}

