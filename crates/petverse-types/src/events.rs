//! Domain events published on the event bus.
//!
//! Every gameplay action has a `Requested` event (a validated, typed request)
//! and a `Response` event (the result envelope). Names follow
//! `game.<feature>.<action>.<phase>`, e.g. `game.food.buy.requested`.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EventPhase, ItemType, MessageType};
use crate::ids::{ClientId, EventId, PetId, PlayerId, SessionId, WasteId};
use crate::messages::ResponseEnvelope;

/// Name of a domain event: a message type plus a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventName {
    /// The gameplay action.
    pub message_type: MessageType,
    /// Request or response.
    pub phase: EventPhase,
}

impl EventName {
    /// The `Requested` event for a message type.
    pub const fn requested(message_type: MessageType) -> Self {
        Self {
            message_type,
            phase: EventPhase::Requested,
        }
    }

    /// The `Response` event for a message type.
    pub const fn response(message_type: MessageType) -> Self {
        Self {
            message_type,
            phase: EventPhase::Response,
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "game.{}.{}.{}",
            self.message_type.feature().as_str(),
            self.message_type.action(),
            self.phase.as_str()
        )
    }
}

/// Partial settings update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New sound flag.
    pub sound_enabled: Option<bool>,
    /// New music flag.
    pub music_enabled: Option<bool>,
    /// New notifications flag.
    pub notifications_enabled: Option<bool>,
    /// New language code.
    pub language: Option<String>,
}

/// A validated, typed gameplay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRequest {
    /// Buy a pet of the given catalog type.
    BuyPet {
        /// Catalog pet type id.
        pet_type_id: String,
        /// Optional display name.
        name: Option<String>,
    },
    /// Feed `quantity` units of a food item to a pet.
    FeedPet {
        /// Target pet.
        pet_id: PetId,
        /// Food item id.
        item_id: String,
        /// Units to consume.
        quantity: u32,
    },
    /// Remove one waste object, or all of them when `waste_id` is `None`.
    CleanPet {
        /// Target pet.
        pet_id: PetId,
        /// Specific waste object to remove.
        waste_id: Option<WasteId>,
    },
    /// Play with a pet using a toy from the inventory.
    PlayWithPet {
        /// Target pet.
        pet_id: PetId,
        /// Toy item id; the first toy in the inventory when `None`.
        item_id: Option<String>,
    },
    /// Release a pet.
    RemovePet {
        /// Target pet.
        pet_id: PetId,
    },
    /// Read projected pet state.
    PetsState,
    /// Buy food.
    BuyFood {
        /// Food item id.
        item_id: String,
        /// Units to buy.
        quantity: u32,
    },
    /// Buy any store item.
    PurchaseItem {
        /// Catalog item id.
        item_id: String,
        /// Expected item type.
        item_type: ItemType,
        /// Units to buy.
        quantity: u32,
    },
    /// Page through the store catalog.
    StoreCatalog {
        /// 1-based page number.
        page: u32,
        /// Entries per page.
        limit: u32,
    },
    /// Page through the inventory.
    Inventory {
        /// 1-based page number.
        page: u32,
        /// Entries per page.
        limit: u32,
    },
    /// Read the game configuration.
    GameConfig,
    /// Read the player's full state.
    PlayerState,
    /// Read the player's profile.
    Profile,
    /// Claim accrued income from all owned pets.
    ClaimDailyReward,
    /// Change settings.
    UpdateSettings(SettingsPatch),
    /// Record tutorial progress.
    UpdateTutorial {
        /// Step reached.
        step: u32,
        /// Whether the tutorial is finished.
        completed: bool,
    },
}

impl ActionRequest {
    /// The wire message type this request was parsed from.
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::BuyPet { .. } => MessageType::BuyPet,
            Self::FeedPet { .. } => MessageType::FeedPet,
            Self::CleanPet { .. } => MessageType::CleanPet,
            Self::PlayWithPet { .. } => MessageType::PlayWithPet,
            Self::RemovePet { .. } => MessageType::RemovePet,
            Self::PetsState => MessageType::RequestPetsState,
            Self::BuyFood { .. } => MessageType::BuyFood,
            Self::PurchaseItem { .. } => MessageType::PurchaseItem,
            Self::StoreCatalog { .. } => MessageType::GetStoreCatalog,
            Self::Inventory { .. } => MessageType::GetInventory,
            Self::GameConfig => MessageType::RequestGameConfig,
            Self::PlayerState => MessageType::RequestPlayerState,
            Self::Profile => MessageType::GetProfile,
            Self::ClaimDailyReward => MessageType::ClaimDailyReward,
            Self::UpdateSettings(_) => MessageType::UpdateSettings,
            Self::UpdateTutorial { .. } => MessageType::UpdateTutorial,
        }
    }
}

/// Event-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "body", rename_all = "snake_case")]
pub enum EventPayload {
    /// Payload of a `Requested` event.
    Request(ActionRequest),
    /// Payload of a `Response` event.
    Response(ResponseEnvelope),
}

/// Who caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventOrigin {
    /// Session the event belongs to.
    pub session_id: SessionId,
    /// Client connection that sent the message.
    pub client_id: ClientId,
    /// Player behind that client.
    pub player_id: PlayerId,
}

/// An immutable domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event id.
    pub id: EventId,
    /// Event name.
    pub name: EventName,
    /// Typed payload.
    pub payload: EventPayload,
    /// Originating session, client, and player.
    pub origin: EventOrigin,
    /// When the event was created.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// Build the `Requested` event for a validated request.
    pub fn requested(request: ActionRequest, origin: EventOrigin, now: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            name: EventName::requested(request.message_type()),
            payload: EventPayload::Request(request),
            origin,
            occurred_at: now,
        }
    }

    /// Build the `Response` event carrying a result envelope.
    pub fn response(
        message_type: MessageType,
        envelope: ResponseEnvelope,
        origin: EventOrigin,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            name: EventName::response(message_type),
            payload: EventPayload::Response(envelope),
            origin,
            occurred_at: now,
        }
    }

    /// The request payload, if this is a `Requested` event.
    pub const fn request(&self) -> Option<&ActionRequest> {
        match &self.payload {
            EventPayload::Request(r) => Some(r),
            EventPayload::Response(_) => None,
        }
    }
}
