//! Food feature.

use petverse_events::{EventBusBuilder, HandlerError};
use petverse_types::{ActionRequest, DomainEvent, EventName, ItemType, MessageType};

use super::inventory::purchase;
use super::unexpected;
use crate::context::RoomContext;
use crate::router::RouterBuilder;
use crate::validation;

/// Register the food routes.
pub fn routes(router: RouterBuilder) -> RouterBuilder {
    router.route(MessageType::BuyFood, validation::buy_food)
}

/// Subscribe the food handlers.
pub fn subscribe(bus: EventBusBuilder<RoomContext>) -> EventBusBuilder<RoomContext> {
    bus.subscribe(EventName::requested(MessageType::BuyFood), "food.buy", buy_food)
}

/// Buy food. Non-food catalog items are rejected.
pub fn buy_food(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::BuyFood { item_id, quantity }) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;
    let rules = &ctx.rules;

    let result = ctx
        .store
        .mutate(|state| purchase(state, rules, player_id, item_id, ItemType::Food, *quantity));

    ctx.reply(event, result);
    Ok(())
}
