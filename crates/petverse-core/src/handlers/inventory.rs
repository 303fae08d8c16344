//! Inventory feature: store purchases, catalog and inventory paging.

use petverse_events::{EventBusBuilder, HandlerError};
use petverse_pets::{GameError, inventory, wallet};
use petverse_types::{ActionRequest, DomainEvent, EventName, InventoryItem, ItemType, MessageType, PlayerId};
use serde_json::json;
use tracing::debug;

use super::{paginate, unexpected};
use crate::config::GameRules;
use crate::context::{Outcome, PersistIntent, RoomContext};
use crate::router::RouterBuilder;
use crate::state::SessionState;
use crate::validation;

/// Register the inventory routes.
pub fn routes(router: RouterBuilder) -> RouterBuilder {
    router
        .route(MessageType::PurchaseItem, validation::purchase_item)
        .route(MessageType::GetStoreCatalog, validation::get_store_catalog)
        .route(MessageType::GetInventory, validation::get_inventory)
}

/// Subscribe the inventory handlers.
pub fn subscribe(bus: EventBusBuilder<RoomContext>) -> EventBusBuilder<RoomContext> {
    bus.subscribe(
        EventName::requested(MessageType::PurchaseItem),
        "inventory.purchase",
        purchase_item,
    )
    .subscribe(
        EventName::requested(MessageType::GetStoreCatalog),
        "inventory.catalog",
        store_catalog,
    )
    .subscribe(
        EventName::requested(MessageType::GetInventory),
        "inventory.list",
        list_inventory,
    )
}

/// Debit `quantity * price` and add the units to the player's inventory.
///
/// The catalog item must be of `expected` type.
pub(crate) fn purchase(
    state: &mut SessionState,
    rules: &GameRules,
    player_id: PlayerId,
    item_id: &str,
    expected: ItemType,
    quantity: u32,
) -> Result<Outcome, GameError> {
    let item = rules
        .catalog
        .item(item_id)
        .ok_or_else(|| GameError::UnknownItem(item_id.to_owned()))?;
    if item.item_type != expected {
        return Err(GameError::ItemTypeMismatch {
            item_id: item_id.to_owned(),
            expected,
            actual: item.item_type,
        });
    }

    let cost = wallet::total_cost(item.price, quantity)?;
    let player = state.player_mut(player_id)?;
    wallet::debit(player, cost)?;
    inventory::add_item(player, item, quantity)?;

    debug!(
        player_id = %player_id,
        item_id,
        quantity,
        cost,
        "item purchased"
    );

    Ok(Outcome::data(json!({
        "item": player.inventory.get(item_id),
        "cost": cost,
        "tokens": player.tokens,
    }))
    .persist(PersistIntent::Player(player_id)))
}

/// Buy any store item, checking its declared type.
pub fn purchase_item(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::PurchaseItem {
        item_id,
        item_type,
        quantity,
    }) = event.request()
    else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;
    let rules = &ctx.rules;

    let result = ctx
        .store
        .mutate(|state| purchase(state, rules, player_id, item_id, *item_type, *quantity));

    ctx.reply(event, result);
    Ok(())
}

/// One page of the store catalog, plus the pet types.
pub fn store_catalog(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::StoreCatalog { page, limit }) = event.request() else {
        return Err(unexpected(event));
    };

    let (items, total) = paginate(&ctx.rules.catalog.items, *page, *limit);
    let data = json!({
        "items": items,
        "pet_types": ctx.rules.catalog.pet_types,
        "page": page,
        "limit": limit,
        "total": total,
    });

    ctx.reply(event, Ok(Outcome::data(data)));
    Ok(())
}

/// One page of the player's inventory, in item id order.
pub fn list_inventory(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::Inventory { page, limit }) = event.request() else {
        return Err(unexpected(event));
    };

    let result = ctx.store.state().player(event.origin.player_id).map(|player| {
        let held: Vec<InventoryItem> = player.inventory.values().cloned().collect();
        let (items, total) = paginate(&held, *page, *limit);
        Outcome::data(json!({
            "items": items,
            "page": page,
            "limit": limit,
            "total": total,
        }))
    });

    ctx.reply(event, result);
    Ok(())
}
