//! Payload validators for inbound messages.
//!
//! One function per message type turns an untyped JSON payload into a
//! typed [`ActionRequest`] or a list of [`FieldError`]s. Fields are
//! optional-with-defaults unless a business rule needs them; a missing
//! mandatory field is a validation failure, never a domain error.
//!
//! Wire field names are camelCase (`itemId`, `petTypeId`).

use core::fmt;
use core::str::FromStr;

use petverse_types::{ActionRequest, ItemType, PetId, SettingsPatch, WasteId};
use serde_json::{Map, Value};

/// Upper bound for a single purchase or feed quantity.
pub const MAX_QUANTITY: u32 = 999;

/// Upper bound for a listing page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the client sends none.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Longest accepted pet name.
const MAX_NAME_LEN: usize = 32;

/// Longest accepted language code.
const MAX_LANGUAGE_LEN: usize = 16;

/// Why one payload field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field.
    pub field: &'static str,
    /// What was wrong with it.
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Result of validating one payload.
pub type Validated = Result<ActionRequest, Vec<FieldError>>;

/// A payload validator.
pub type Validator = fn(&Value) -> Validated;

/// Field reader that accumulates errors instead of stopping at the first.
struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn new(payload: &'a Value) -> Self {
        let mut errors = Vec::new();
        let map = match payload {
            Value::Object(map) => Some(map),
            Value::Null => None,
            _ => {
                errors.push(FieldError {
                    field: "payload",
                    reason: String::from("must be an object"),
                });
                None
            }
        };
        Self { map, errors }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map
            .and_then(|m| m.get(field))
            .filter(|v| !v.is_null())
    }

    fn reject(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            reason: reason.into(),
        });
    }

    fn optional_str(&mut self, field: &'static str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Value::String(_) => {
                self.reject(field, "must not be empty");
                None
            }
            _ => {
                self.reject(field, "must be a string");
                None
            }
        }
    }

    fn required_str(&mut self, field: &'static str) -> String {
        if self.get(field).is_none() {
            self.reject(field, "is required");
            return String::new();
        }
        self.optional_str(field).unwrap_or_default()
    }

    /// First present field out of several accepted aliases.
    fn required_str_any(&mut self, fields: &[&'static str]) -> String {
        for &field in fields {
            if self.get(field).is_some() {
                return self.required_str(field);
            }
        }
        let field = fields.first().copied().unwrap_or("field");
        self.reject(field, "is required");
        String::new()
    }

    fn optional_u32(&mut self, field: &'static str, min: u32, max: u32) -> Option<u32> {
        let value = self.get(field)?;
        let parsed = value.as_u64().and_then(|n| u32::try_from(n).ok());
        match parsed {
            Some(n) if (min..=max).contains(&n) => Some(n),
            Some(_) | None => {
                self.reject(field, format!("must be an integer between {min} and {max}"));
                None
            }
        }
    }

    fn required_u32(&mut self, field: &'static str, min: u32, max: u32) -> u32 {
        if self.get(field).is_none() {
            self.reject(field, "is required");
            return min;
        }
        self.optional_u32(field, min, max).unwrap_or(min)
    }

    fn optional_bool(&mut self, field: &'static str) -> Option<bool> {
        match self.get(field)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.reject(field, "must be a boolean");
                None
            }
        }
    }

    fn optional_parsed<T: FromStr>(&mut self, field: &'static str, what: &str) -> Option<T> {
        let raw = self.optional_str(field)?;
        if let Ok(v) = raw.parse() {
            Some(v)
        } else {
            self.reject(field, format!("must be a valid {what}"));
            None
        }
    }

    fn required_parsed<T: FromStr + Default>(&mut self, field: &'static str, what: &str) -> T {
        if self.get(field).is_none() {
            self.reject(field, "is required");
            return T::default();
        }
        self.optional_parsed(field, what).unwrap_or_default()
    }

    fn finish(self, request: ActionRequest) -> Validated {
        if self.errors.is_empty() {
            Ok(request)
        } else {
            Err(self.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Pet
// ---------------------------------------------------------------------------

/// `buy_pet`: `petType` or `petTypeId` required, `name` optional.
pub fn buy_pet(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let pet_type_id = f.required_str_any(&["petTypeId", "petType"]);
    let name = f.optional_str("name");
    if name.as_ref().is_some_and(|n| n.chars().count() > MAX_NAME_LEN) {
        f.reject("name", format!("must be at most {MAX_NAME_LEN} characters"));
    }
    f.finish(ActionRequest::BuyPet { pet_type_id, name })
}

/// `feed_pet`: `petId`, `itemId`, and `itemType` (`food`) required,
/// `quantity` defaults to 1.
pub fn feed_pet(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let pet_id: PetId = f.required_parsed("petId", "pet id");
    let item_id = f.required_str("itemId");
    let quantity = f.optional_u32("quantity", 1, MAX_QUANTITY).unwrap_or(1);
    expect_item_type(&mut f, ItemType::Food);
    f.finish(ActionRequest::FeedPet {
        pet_id,
        item_id,
        quantity,
    })
}

/// `clean_pet`: `petId` required, `wasteId` optional.
pub fn clean_pet(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let pet_id: PetId = f.required_parsed("petId", "pet id");
    let waste_id: Option<WasteId> = f.optional_parsed("wasteId", "waste id");
    f.finish(ActionRequest::CleanPet { pet_id, waste_id })
}

/// `play_with_pet`: `petId` required, `itemId` optional.
pub fn play_with_pet(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let pet_id: PetId = f.required_parsed("petId", "pet id");
    let item_id = f.optional_str("itemId");
    f.finish(ActionRequest::PlayWithPet { pet_id, item_id })
}

/// `remove_pet`: `petId` required.
pub fn remove_pet(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let pet_id: PetId = f.required_parsed("petId", "pet id");
    f.finish(ActionRequest::RemovePet { pet_id })
}

/// `request_pets_state`: no fields.
pub fn request_pets_state(payload: &Value) -> Validated {
    Fields::new(payload).finish(ActionRequest::PetsState)
}

// ---------------------------------------------------------------------------
// Food and inventory
// ---------------------------------------------------------------------------

/// `buy_food`: `itemId`, `itemType` (`food`), and `quantity` required.
pub fn buy_food(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let item_id = f.required_str("itemId");
    let quantity = f.required_u32("quantity", 1, MAX_QUANTITY);
    expect_item_type(&mut f, ItemType::Food);
    f.finish(ActionRequest::BuyFood { item_id, quantity })
}

/// `purchase_item`: `itemId`, `itemType`, and `quantity` required.
pub fn purchase_item(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let item_id = f.required_str("itemId");
    let item_type: Option<ItemType> = if f.get("itemType").is_some() {
        f.optional_parsed("itemType", "item type")
    } else {
        f.reject("itemType", "is required");
        None
    };
    let quantity = f.required_u32("quantity", 1, MAX_QUANTITY);
    f.finish(ActionRequest::PurchaseItem {
        item_id,
        item_type: item_type.unwrap_or(ItemType::Accessory),
        quantity,
    })
}

/// `get_store_catalog`: `page` and `limit` optional.
pub fn get_store_catalog(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let (page, limit) = paging(&mut f);
    f.finish(ActionRequest::StoreCatalog { page, limit })
}

/// `get_inventory`: `page` and `limit` optional.
pub fn get_inventory(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let (page, limit) = paging(&mut f);
    f.finish(ActionRequest::Inventory { page, limit })
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// `request_game_config`: no fields.
pub fn request_game_config(payload: &Value) -> Validated {
    Fields::new(payload).finish(ActionRequest::GameConfig)
}

/// `request_player_state`: no fields.
pub fn request_player_state(payload: &Value) -> Validated {
    Fields::new(payload).finish(ActionRequest::PlayerState)
}

/// `get_profile`: no fields.
pub fn get_profile(payload: &Value) -> Validated {
    Fields::new(payload).finish(ActionRequest::Profile)
}

/// `claim_daily_reward`: no fields.
pub fn claim_daily_reward(payload: &Value) -> Validated {
    Fields::new(payload).finish(ActionRequest::ClaimDailyReward)
}

/// `update_settings`: at least one of `soundEnabled`, `musicEnabled`,
/// `notificationsEnabled`, `language`.
pub fn update_settings(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let patch = SettingsPatch {
        sound_enabled: f.optional_bool("soundEnabled"),
        music_enabled: f.optional_bool("musicEnabled"),
        notifications_enabled: f.optional_bool("notificationsEnabled"),
        language: f.optional_str("language"),
    };
    if patch
        .language
        .as_ref()
        .is_some_and(|l| l.chars().count() > MAX_LANGUAGE_LEN)
    {
        f.reject(
            "language",
            format!("must be at most {MAX_LANGUAGE_LEN} characters"),
        );
    }
    if patch == SettingsPatch::default() && f.errors.is_empty() {
        f.reject("payload", "no settings provided");
    }
    f.finish(ActionRequest::UpdateSettings(patch))
}

/// `update_tutorial`: `step` required, `completed` optional.
pub fn update_tutorial(payload: &Value) -> Validated {
    let mut f = Fields::new(payload);
    let step = f.required_u32("step", 0, u32::MAX);
    let completed = f.optional_bool("completed").unwrap_or(false);
    f.finish(ActionRequest::UpdateTutorial { step, completed })
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

fn paging(f: &mut Fields<'_>) -> (u32, u32) {
    let page = f.optional_u32("page", 1, u32::MAX).unwrap_or(1);
    let limit = f
        .optional_u32("limit", 1, MAX_PAGE_SIZE)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    (page, limit)
}

fn expect_item_type(f: &mut Fields<'_>, expected: ItemType) {
    if f.get("itemType").is_none() {
        f.reject("itemType", "is required");
        return;
    }
    if let Some(actual) = f.optional_parsed::<ItemType>("itemType", "item type")
        && actual != expected
    {
        f.reject("itemType", format!("must be {}", expected.as_str()));
    }
}
