//! Per-session context handed to domain handlers.
//!
//! The event bus is shared by every room; the [`RoomContext`] is what makes
//! a publish session-specific. Handlers mutate the store through it and
//! leave their results in its reply outbox. The room drains the outbox
//! after each dispatch, persists what the replies name, and delivers the
//! response envelopes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use petverse_pets::GameError;
use petverse_types::{DomainEvent, EventOrigin, MessageType, PetId, PlayerId, SessionId};
use serde_json::Value;

use crate::config::GameRules;
use crate::store::ReplicatedStateStore;

/// A write the room must perform once the handler has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistIntent {
    /// Save the player document.
    Player(PlayerId),
    /// Save the pet document.
    Pet(PetId),
    /// Delete the pet document.
    DeletePet {
        /// Removed pet.
        pet_id: PetId,
        /// Its former owner.
        owner: PlayerId,
    },
}

/// Successful handler result.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Response data.
    pub data: Value,
    /// Optional human-readable message.
    pub message: Option<String>,
    /// Writes required before the response can report success.
    pub persist: Vec<PersistIntent>,
}

impl Outcome {
    /// A result with nothing to persist.
    pub const fn data(data: Value) -> Self {
        Self {
            data,
            message: None,
            persist: Vec::new(),
        }
    }

    /// Add a write.
    #[must_use]
    pub fn persist(mut self, intent: PersistIntent) -> Self {
        self.persist.push(intent);
        self
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A handler result waiting for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Who asked.
    pub origin: EventOrigin,
    /// What they asked for.
    pub message_type: MessageType,
    /// The result.
    pub result: Result<Outcome, GameError>,
}

/// Mutable session context for one publish.
#[derive(Debug)]
pub struct RoomContext {
    /// The session's replicated state.
    pub store: ReplicatedStateStore,
    /// Balance values.
    pub rules: Arc<GameRules>,
    /// Time of the message being processed.
    pub now: DateTime<Utc>,
    replies: Vec<Reply>,
}

impl RoomContext {
    /// Fresh context with an empty store.
    pub fn new(session_id: SessionId, created_at: DateTime<Utc>, rules: Arc<GameRules>) -> Self {
        Self {
            store: ReplicatedStateStore::new(session_id, created_at),
            rules,
            now: created_at,
            replies: Vec::new(),
        }
    }

    /// Queue the result of handling `event`.
    pub fn reply(&mut self, event: &DomainEvent, result: Result<Outcome, GameError>) {
        self.replies.push(Reply {
            origin: event.origin,
            message_type: event.name.message_type,
            result,
        });
    }

    /// Take every queued reply.
    pub fn take_replies(&mut self) -> Vec<Reply> {
        std::mem::take(&mut self.replies)
    }
}
