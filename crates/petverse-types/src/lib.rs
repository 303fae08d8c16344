//! Shared type definitions for the Petverse session engine.
//!
//! This crate is the single source of truth for all types used across the
//! Petverse workspace. Wire-facing types flow downstream to `TypeScript` via
//! `ts-rs` for the game client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Closed enumerations (message types, item types, status)
//! - [`structs`] -- Players, pets, inventory, and catalog entries
//! - [`messages`] -- Client wire envelopes and state-replication updates
//! - [`events`] -- Domain events and typed action requests

pub mod enums;
pub mod events;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EventPhase, Feature, ItemType, MessageType, PetStatus, UnknownVariant};
pub use events::{ActionRequest, DomainEvent, EventName, EventOrigin, EventPayload, SettingsPatch};
pub use ids::{ClientId, EventId, PetId, PlayerId, SessionId, WasteId};
pub use messages::{
    InboundMessage, OutboundMessage, PatchKind, PatchOp, ResponseEnvelope, StateUpdate,
};
pub use structs::{
    IncomeCycle, InventoryItem, ItemDef, ItemEffect, Pet, PetTypeDef, Player, PlayerIdentity,
    PlayerSettings, Position, Stat, TutorialProgress, WasteObject,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the game client.

    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::PetId::export_all();
        let _ = crate::ids::WasteId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::ClientId::export_all();

        // Enums
        let _ = crate::enums::ItemType::export_all();
        let _ = crate::enums::PetStatus::export_all();
        let _ = crate::enums::Feature::export_all();
        let _ = crate::enums::MessageType::export_all();
        let _ = crate::enums::EventPhase::export_all();

        // Structs
        let _ = crate::structs::PlayerIdentity::export_all();
        let _ = crate::structs::PlayerSettings::export_all();
        let _ = crate::structs::TutorialProgress::export_all();
        let _ = crate::structs::InventoryItem::export_all();
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::Stat::export_all();
        let _ = crate::structs::IncomeCycle::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::WasteObject::export_all();
        let _ = crate::structs::Pet::export_all();
        let _ = crate::structs::ItemEffect::export_all();
        let _ = crate::structs::PetTypeDef::export_all();
        let _ = crate::structs::ItemDef::export_all();

        // Wire
        let _ = crate::messages::InboundMessage::export_all();
        let _ = crate::messages::ResponseEnvelope::export_all();
        let _ = crate::messages::OutboundMessage::export_all();
        let _ = crate::messages::PatchKind::export_all();
        let _ = crate::messages::PatchOp::export_all();
        let _ = crate::messages::StateUpdate::export_all();
    }
}
