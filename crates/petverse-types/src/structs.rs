//! Core entity structs for players, pets, and the store catalog.
//!
//! These are plain data: no behaviour beyond small constructors. Decay and
//! income arithmetic lives in `petverse-pets`; the replicated tree that holds
//! these values lives in `petverse-core`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ItemType;
use crate::ids::{PetId, PlayerId, WasteId};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identity handed to the session engine by the authentication layer.
///
/// The engine never verifies signatures itself; it trusts whatever the
/// upstream gateway resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerIdentity {
    /// Wallet or account address.
    pub wallet: String,
    /// Name shown to other players.
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Client-side preferences stored with the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSettings {
    /// Sound effects on or off.
    pub sound_enabled: bool,
    /// Background music on or off.
    pub music_enabled: bool,
    /// Push notifications on or off.
    pub notifications_enabled: bool,
    /// UI language code.
    pub language: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            notifications_enabled: true,
            language: String::from("en"),
        }
    }
}

/// Tutorial progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TutorialProgress {
    /// Last step the player reached.
    pub step: u32,
    /// Whether the tutorial has been finished.
    pub completed: bool,
}

/// One stack of items in a player's inventory.
///
/// Entries are never removed: `quantity` may drop to zero while
/// `total_purchased` only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InventoryItem {
    /// Catalog item id.
    pub item_id: String,
    /// Catalog item type.
    pub item_type: ItemType,
    /// Display name copied from the catalog at first purchase.
    pub name: String,
    /// Units currently held.
    pub quantity: u32,
    /// Units bought over the player's lifetime.
    pub total_purchased: u64,
}

/// A player in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Wallet or account address the player authenticated with.
    pub wallet: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Token balance. Unsigned, so it can never go negative.
    pub tokens: u64,
    /// Number of pets currently owned.
    pub owned_pet_count: u32,
    /// When the player first joined.
    pub joined_at: DateTime<Utc>,
    /// Client preferences.
    pub settings: PlayerSettings,
    /// Tutorial progress.
    pub tutorial: TutorialProgress,
    /// Inventory keyed by catalog item id.
    pub inventory: BTreeMap<String, InventoryItem>,
}

impl Player {
    /// Create a fresh player with the given starting balance.
    pub fn new(identity: &PlayerIdentity, tokens: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: PlayerId::new(),
            wallet: identity.wallet.clone(),
            display_name: identity.display_name.clone(),
            tokens,
            owned_pet_count: 0,
            joined_at: now,
            settings: PlayerSettings::default(),
            tutorial: TutorialProgress::default(),
            inventory: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pet
// ---------------------------------------------------------------------------

/// A decaying stat and the moment it was last written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Stat {
    /// Stored value in `[0, 100]`.
    pub value: f64,
    /// When `value` was last committed.
    pub last_updated: DateTime<Utc>,
}

impl Stat {
    /// A stat at full value.
    pub const fn full(now: DateTime<Utc>) -> Self {
        Self {
            value: 100.0,
            last_updated: now,
        }
    }
}

/// Income accrual descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct IncomeCycle {
    /// Length of one cycle in seconds.
    pub cycle_length_secs: u64,
    /// Tokens paid out per completed cycle.
    pub amount_per_cycle: u64,
    /// When income was last claimed.
    pub last_claim: DateTime<Utc>,
}

/// A point on the pet's play area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

/// Waste left behind by a pet. Removed by cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WasteObject {
    /// Unique waste identifier.
    pub id: WasteId,
    /// Pet that produced it.
    pub pet_id: PetId,
    /// Where it sits.
    pub position: Position,
}

/// A pet owned by exactly one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Pet {
    /// Unique pet identifier.
    pub id: PetId,
    /// Owning player.
    pub owner_id: PlayerId,
    /// Catalog pet type id.
    pub pet_type_id: String,
    /// Display name.
    pub name: String,
    /// Hunger stat (100 = fully fed).
    pub hunger: Stat,
    /// Happiness stat.
    pub happiness: Stat,
    /// Cleanliness stat.
    pub cleanliness: Stat,
    /// When the pet was bought.
    pub birth_time: DateTime<Utc>,
    /// Seconds from birth until adulthood.
    pub growth_duration_secs: u64,
    /// Latched adulthood flag. Never reverts once set.
    pub is_adult: bool,
    /// Income accrual state.
    pub income: IncomeCycle,
    /// Waste objects in creation order.
    pub waste: Vec<WasteObject>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Stat deltas applied when an item is used on a pet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct ItemEffect {
    /// Points added to hunger.
    pub hunger: f64,
    /// Points added to happiness.
    pub happiness: f64,
    /// Points added to cleanliness.
    pub cleanliness: f64,
}

/// A purchasable pet type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PetTypeDef {
    /// Catalog id, e.g. `"cat"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Price in tokens.
    pub price: u64,
    /// Seconds until adulthood.
    pub growth_duration_secs: u64,
    /// Income cycle length in seconds.
    pub income_cycle_secs: u64,
    /// Tokens earned per income cycle.
    pub income_per_cycle: u64,
}

/// A purchasable store item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemDef {
    /// Catalog id, e.g. `"apple"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Item category.
    pub item_type: ItemType,
    /// Price per unit in tokens.
    pub price: u64,
    /// Stat effect when used on a pet.
    #[serde(default)]
    pub effect: ItemEffect,
}
