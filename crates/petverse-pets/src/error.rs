//! Error types for the petverse-pets crate.
//!
//! [`GameError`] is the business-rule failure taxonomy. Every variant maps
//! to a stable wire code via [`GameError::code`]; the session engine turns
//! these into `success: false` response envelopes.

use petverse_types::{ItemType, PetId, PlayerId, WasteId};

/// A gameplay rule was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The player cannot afford the purchase.
    #[error("insufficient tokens: need {required}, have {available}")]
    InsufficientTokens {
        /// Total price of the purchase.
        required: u64,
        /// Current balance.
        available: u64,
    },

    /// No pet type with this id exists in the catalog.
    #[error("unknown pet type: {0}")]
    UnknownPetType(String),

    /// No store item with this id exists in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The catalog item is not of the requested type.
    #[error("item {item_id} is {actual:?}, expected {expected:?}")]
    ItemTypeMismatch {
        /// Catalog item id.
        item_id: String,
        /// Type the request asked for.
        expected: ItemType,
        /// Type the catalog declares.
        actual: ItemType,
    },

    /// The pet does not exist in this session.
    #[error("pet not found: {0}")]
    PetNotFound(PetId),

    /// The pet belongs to another player.
    #[error("pet {0} is owned by another player")]
    NotPetOwner(PetId),

    /// The inventory does not hold enough units.
    #[error("insufficient items: wanted {requested} of {item_id} but only have {available}")]
    InsufficientItems {
        /// Catalog item id.
        item_id: String,
        /// Units the caller tried to consume.
        requested: u32,
        /// Units held.
        available: u32,
    },

    /// The item cannot be fed to a pet.
    #[error("item {0} is not food")]
    NotEdible(String),

    /// The waste object does not belong to the pet.
    #[error("waste not found: {0}")]
    WasteNotFound(WasteId),

    /// No pet has accrued a full income cycle.
    #[error("no reward available")]
    NoRewardAvailable,

    /// The player is not part of this session.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Persisting the result failed after retries.
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}

impl GameError {
    /// Stable machine-readable code sent to clients.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientTokens { .. } => "INSUFFICIENT_TOKENS",
            Self::UnknownPetType(_) => "UNKNOWN_PET_TYPE",
            Self::UnknownItem(_) => "UNKNOWN_ITEM",
            Self::ItemTypeMismatch { .. } => "ITEM_TYPE_MISMATCH",
            Self::PetNotFound(_) => "PET_NOT_FOUND",
            Self::NotPetOwner(_) => "NOT_PET_OWNER",
            Self::InsufficientItems { .. } => "INSUFFICIENT_ITEMS",
            Self::NotEdible(_) => "NOT_EDIBLE",
            Self::WasteNotFound(_) => "WASTE_NOT_FOUND",
            Self::NoRewardAvailable => "NO_REWARD_AVAILABLE",
            Self::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            Self::PersistenceFailed(_) => "PERSISTENCE_FAILED",
            Self::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
        }
    }
}
