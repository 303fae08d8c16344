//! Enumeration types for the Petverse session engine.
//!
//! The wire message types and the domain-event names derived from them are
//! closed enumerations: anything not listed here is rejected at the router.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Category of a purchasable store item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ItemType {
    /// Consumed by `feed_pet` to restore hunger.
    Food,
    /// Used by `play_with_pet` to restore happiness.
    Toy,
    /// Cleaning supplies.
    Cleaning,
    /// Cosmetic accessory with no stat effect.
    Accessory,
}

impl ItemType {
    /// Wire name of the item type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Toy => "toy",
            Self::Cleaning => "cleaning",
            Self::Accessory => "accessory",
        }
    }
}

impl FromStr for ItemType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(Self::Food),
            "toy" => Ok(Self::Toy),
            "cleaning" => Ok(Self::Cleaning),
            "accessory" => Ok(Self::Accessory),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Pet status
// ---------------------------------------------------------------------------

/// Derived pet status.
///
/// Never stored: it is recomputed from the projected stats every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PetStatus {
    /// At least one stat is above zero.
    Active,
    /// Hunger, happiness, and cleanliness have all reached zero.
    Exhausted,
}

// ---------------------------------------------------------------------------
// Wire message types
// ---------------------------------------------------------------------------

/// Gameplay feature a message belongs to. Routes are registered per feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Feature {
    /// Pet purchase and care.
    Pet,
    /// Food purchases.
    Food,
    /// Store catalog and inventory.
    Inventory,
    /// Player profile, settings, and rewards.
    Player,
}

impl Feature {
    /// Namespace segment used in event names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pet => "pet",
            Self::Food => "food",
            Self::Inventory => "inventory",
            Self::Player => "player",
        }
    }
}

/// Inbound wire message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MessageType {
    /// Buy a new pet of a catalog type.
    BuyPet,
    /// Feed a pet from the inventory.
    FeedPet,
    /// Remove waste from a pet.
    CleanPet,
    /// Play with a pet using a toy.
    PlayWithPet,
    /// Release a pet.
    RemovePet,
    /// Read the projected state of the player's pets.
    RequestPetsState,
    /// Buy food items.
    BuyFood,
    /// Buy any store item.
    PurchaseItem,
    /// Page through the store catalog.
    GetStoreCatalog,
    /// Page through the player's inventory.
    GetInventory,
    /// Read the game configuration.
    RequestGameConfig,
    /// Read the player's full state.
    RequestPlayerState,
    /// Read the player's public profile.
    GetProfile,
    /// Claim accrued pet income.
    ClaimDailyReward,
    /// Change player settings.
    UpdateSettings,
    /// Record tutorial progress.
    UpdateTutorial,
}

impl MessageType {
    /// Every message type, in registration order.
    pub const ALL: [Self; 16] = [
        Self::BuyPet,
        Self::FeedPet,
        Self::CleanPet,
        Self::PlayWithPet,
        Self::RemovePet,
        Self::RequestPetsState,
        Self::BuyFood,
        Self::PurchaseItem,
        Self::GetStoreCatalog,
        Self::GetInventory,
        Self::RequestGameConfig,
        Self::RequestPlayerState,
        Self::GetProfile,
        Self::ClaimDailyReward,
        Self::UpdateSettings,
        Self::UpdateTutorial,
    ];

    /// Wire name of the message type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuyPet => "buy_pet",
            Self::FeedPet => "feed_pet",
            Self::CleanPet => "clean_pet",
            Self::PlayWithPet => "play_with_pet",
            Self::RemovePet => "remove_pet",
            Self::RequestPetsState => "request_pets_state",
            Self::BuyFood => "buy_food",
            Self::PurchaseItem => "purchase_item",
            Self::GetStoreCatalog => "get_store_catalog",
            Self::GetInventory => "get_inventory",
            Self::RequestGameConfig => "request_game_config",
            Self::RequestPlayerState => "request_player_state",
            Self::GetProfile => "get_profile",
            Self::ClaimDailyReward => "claim_daily_reward",
            Self::UpdateSettings => "update_settings",
            Self::UpdateTutorial => "update_tutorial",
        }
    }

    /// Feature that owns this message type.
    pub const fn feature(self) -> Feature {
        match self {
            Self::BuyPet
            | Self::FeedPet
            | Self::CleanPet
            | Self::PlayWithPet
            | Self::RemovePet
            | Self::RequestPetsState => Feature::Pet,
            Self::BuyFood => Feature::Food,
            Self::PurchaseItem | Self::GetStoreCatalog | Self::GetInventory => Feature::Inventory,
            Self::RequestGameConfig
            | Self::RequestPlayerState
            | Self::GetProfile
            | Self::ClaimDailyReward
            | Self::UpdateSettings
            | Self::UpdateTutorial => Feature::Player,
        }
    }

    /// Action segment used in event names (`game.<feature>.<action>`).
    pub const fn action(self) -> &'static str {
        match self {
            Self::BuyPet | Self::BuyFood => "buy",
            Self::FeedPet => "feed",
            Self::CleanPet => "clean",
            Self::PlayWithPet => "play",
            Self::RemovePet => "remove",
            Self::RequestPetsState | Self::RequestPlayerState => "state",
            Self::PurchaseItem => "purchase",
            Self::GetStoreCatalog => "catalog",
            Self::GetInventory => "list",
            Self::RequestGameConfig => "config",
            Self::GetProfile => "profile",
            Self::ClaimDailyReward => "reward",
            Self::UpdateSettings => "settings",
            Self::UpdateTutorial => "tutorial",
        }
    }

    /// Outbound message type carrying the result of this request.
    pub fn response_type(self) -> String {
        format!("{}_response", self.as_str())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Event phase
// ---------------------------------------------------------------------------

/// Whether a domain event announces a request or carries its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventPhase {
    /// A validated request awaiting domain processing.
    Requested,
    /// The outcome of domain processing.
    Response,
}

impl EventPhase {
    /// Suffix used in event names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Response => "response",
        }
    }
}

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}
