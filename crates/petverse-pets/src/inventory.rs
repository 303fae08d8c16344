//! Inventory operations for players.
//!
//! Entries are keyed by catalog item id and created on first purchase.
//! They are never deleted; quantity may fall to zero while the lifetime
//! purchase counter keeps growing.

use petverse_types::{InventoryItem, ItemDef, ItemType, Player};

use crate::error::GameError;

/// Units of `item_id` the player holds.
pub fn quantity_of(player: &Player, item_id: &str) -> u32 {
    player.inventory.get(item_id).map_or(0, |i| i.quantity)
}

/// First held item of the given type with a non-zero quantity.
pub fn first_of_type(player: &Player, item_type: ItemType) -> Option<&InventoryItem> {
    player
        .inventory
        .values()
        .find(|i| i.item_type == item_type && i.quantity > 0)
}

/// Add `quantity` units of a catalog item.
pub fn add_item(player: &mut Player, def: &ItemDef, quantity: u32) -> Result<(), GameError> {
    let entry = player
        .inventory
        .entry(def.id.clone())
        .or_insert_with(|| InventoryItem {
            item_id: def.id.clone(),
            item_type: def.item_type,
            name: def.name.clone(),
            quantity: 0,
            total_purchased: 0,
        });

    let new_quantity =
        entry
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| GameError::ArithmeticOverflow {
                context: format!("inventory quantity overflow for {}", def.id),
            })?;
    let new_total = entry
        .total_purchased
        .checked_add(u64::from(quantity))
        .ok_or_else(|| GameError::ArithmeticOverflow {
            context: format!("lifetime purchase overflow for {}", def.id),
        })?;

    entry.quantity = new_quantity;
    entry.total_purchased = new_total;
    Ok(())
}

/// Remove `quantity` units. Fails without change if the player holds fewer.
pub fn consume_item(player: &mut Player, item_id: &str, quantity: u32) -> Result<(), GameError> {
    let available = quantity_of(player, item_id);
    let remaining = available
        .checked_sub(quantity)
        .ok_or_else(|| GameError::InsufficientItems {
            item_id: item_id.to_owned(),
            requested: quantity,
            available,
        })?;
    if let Some(entry) = player.inventory.get_mut(item_id) {
        entry.quantity = remaining;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use petverse_types::{ItemEffect, PlayerIdentity};

    use super::*;

    fn apple() -> ItemDef {
        ItemDef {
            id: String::from("apple"),
            name: String::from("Apple"),
            item_type: ItemType::Food,
            price: 5,
            effect: ItemEffect {
                hunger: 20.0,
                ..ItemEffect::default()
            },
        }
    }

    fn player() -> Player {
        let identity = PlayerIdentity {
            wallet: String::from("0x2"),
            display_name: String::from("Rin"),
        };
        Player::new(&identity, 0, Utc::now())
    }

    #[test]
    fn first_purchase_creates_entry() {
        let mut p = player();
        assert!(add_item(&mut p, &apple(), 3).is_ok());
        let entry = p.inventory.get("apple");
        assert_eq!(entry.map(|e| (e.quantity, e.total_purchased)), Some((3, 3)));
    }

    #[test]
    fn consuming_to_zero_keeps_entry_and_lifetime_total() {
        let mut p = player();
        assert!(add_item(&mut p, &apple(), 2).is_ok());
        assert!(consume_item(&mut p, "apple", 2).is_ok());
        let entry = p.inventory.get("apple");
        assert_eq!(entry.map(|e| (e.quantity, e.total_purchased)), Some((0, 2)));
        assert!(first_of_type(&p, ItemType::Food).is_none());
    }

    #[test]
    fn over_consumption_is_rejected() {
        let mut p = player();
        assert!(add_item(&mut p, &apple(), 1).is_ok());
        let result = consume_item(&mut p, "apple", 2);
        assert_eq!(
            result,
            Err(GameError::InsufficientItems {
                item_id: String::from("apple"),
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(quantity_of(&p, "apple"), 1);
    }

    #[test]
    fn consuming_unknown_item_reports_zero_available() {
        let mut p = player();
        assert!(matches!(
            consume_item(&mut p, "bone", 1),
            Err(GameError::InsufficientItems { available: 0, .. })
        ));
    }
}
