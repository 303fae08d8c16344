//! Pet feature: buy, feed, clean, play, remove, and state queries.

use chrono::{DateTime, Utc};
use petverse_events::{EventBusBuilder, HandlerError};
use petverse_pets::{GameError, inventory, lifecycle, project_stats, wallet};
use petverse_types::{ActionRequest, DomainEvent, EventName, ItemType, MessageType, Pet};
use serde_json::{Value, json};
use tracing::debug;

use super::unexpected;
use crate::config::GameRules;
use crate::context::{Outcome, PersistIntent, RoomContext};
use crate::router::RouterBuilder;
use crate::validation;

/// Register the pet routes.
pub fn routes(router: RouterBuilder) -> RouterBuilder {
    router
        .route(MessageType::BuyPet, validation::buy_pet)
        .route(MessageType::FeedPet, validation::feed_pet)
        .route(MessageType::CleanPet, validation::clean_pet)
        .route(MessageType::PlayWithPet, validation::play_with_pet)
        .route(MessageType::RemovePet, validation::remove_pet)
        .route(MessageType::RequestPetsState, validation::request_pets_state)
}

/// Subscribe the pet handlers.
pub fn subscribe(bus: EventBusBuilder<RoomContext>) -> EventBusBuilder<RoomContext> {
    bus.subscribe(EventName::requested(MessageType::BuyPet), "pet.buy", buy_pet)
        .subscribe(EventName::requested(MessageType::FeedPet), "pet.feed", feed_pet)
        .subscribe(EventName::requested(MessageType::CleanPet), "pet.clean", clean_pet)
        .subscribe(EventName::requested(MessageType::PlayWithPet), "pet.play", play_with_pet)
        .subscribe(EventName::requested(MessageType::RemovePet), "pet.remove", remove_pet)
        .subscribe(EventName::requested(MessageType::RequestPetsState), "pet.state", pets_state)
}

fn pet_view(pet: &Pet, now: DateTime<Utc>, rules: &GameRules) -> Value {
    json!({
        "pet": pet,
        "stats": project_stats(pet, now, &rules.lifecycle),
    })
}

/// Debit the pet type's price and add a newborn pet.
pub fn buy_pet(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::BuyPet { pet_type_id, name }) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;
    let now = ctx.now;
    let rules = &ctx.rules;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        let def = rules
            .catalog
            .pet_type(pet_type_id)
            .ok_or_else(|| GameError::UnknownPetType(pet_type_id.clone()))?;
        let player = state.player_mut(player_id)?;
        wallet::debit(player, def.price)?;
        player.owned_pet_count = player.owned_pet_count.saturating_add(1);
        let tokens = player.tokens;

        let pet = petverse_pets::pet::create_pet(player_id, def, name.clone(), now);
        let pet_id = pet.id;
        let data = json!({ "pet": &pet, "tokens": tokens });
        state.pets.insert(pet_id, pet);

        debug!(player_id = %player_id, pet_id = %pet_id, pet_type = %def.id, "pet bought");
        Ok(Outcome::data(data)
            .message(format!("adopted a {}", def.name))
            .persist(PersistIntent::Player(player_id))
            .persist(PersistIntent::Pet(pet_id)))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Consume food from the inventory and apply its effect to a pet.
pub fn feed_pet(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::FeedPet {
        pet_id,
        item_id,
        quantity,
    }) = event.request()
    else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;
    let now = ctx.now;
    let rules = &ctx.rules;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        let item = rules
            .catalog
            .item(item_id)
            .ok_or_else(|| GameError::UnknownItem(item_id.clone()))?;
        if item.item_type != ItemType::Food {
            return Err(GameError::NotEdible(item_id.clone()));
        }
        state.owned_pet(*pet_id, player_id)?;

        inventory::consume_item(state.player_mut(player_id)?, item_id, *quantity)?;

        let pet = state.owned_pet_mut(*pet_id, player_id)?;
        lifecycle::apply_care(
            pet,
            &item.effect,
            *quantity,
            now,
            &rules.lifecycle,
            &mut rand::rng(),
        );

        Ok(Outcome::data(pet_view(pet, now, rules))
            .persist(PersistIntent::Player(player_id))
            .persist(PersistIntent::Pet(*pet_id)))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Remove waste and restore cleanliness.
pub fn clean_pet(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::CleanPet { pet_id, waste_id }) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;
    let now = ctx.now;
    let rules = &ctx.rules;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        let pet = state.owned_pet_mut(*pet_id, player_id)?;
        let removed = lifecycle::clean(pet, *waste_id, now, &rules.lifecycle, &mut rand::rng())?;

        let mut data = pet_view(pet, now, rules);
        if let Some(obj) = data.as_object_mut() {
            obj.insert(String::from("removed"), json!(removed));
        }
        Ok(Outcome::data(data).persist(PersistIntent::Pet(*pet_id)))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Use a toy on a pet.
///
/// The named toy, or the first toy in the inventory when none is named.
pub fn play_with_pet(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::PlayWithPet { pet_id, item_id }) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;
    let now = ctx.now;
    let rules = &ctx.rules;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        state.owned_pet(*pet_id, player_id)?;
        let player = state.player_mut(player_id)?;

        let toy_id = match item_id {
            Some(id) => id.clone(),
            None => inventory::first_of_type(player, ItemType::Toy)
                .map(|i| i.item_id.clone())
                .ok_or_else(|| GameError::InsufficientItems {
                    item_id: String::from(ItemType::Toy.as_str()),
                    requested: 1,
                    available: 0,
                })?,
        };
        let toy = rules
            .catalog
            .item(&toy_id)
            .ok_or_else(|| GameError::UnknownItem(toy_id.clone()))?;
        if toy.item_type != ItemType::Toy {
            return Err(GameError::ItemTypeMismatch {
                item_id: toy_id,
                expected: ItemType::Toy,
                actual: toy.item_type,
            });
        }
        inventory::consume_item(player, &toy.id, 1)?;

        let pet = state.owned_pet_mut(*pet_id, player_id)?;
        lifecycle::apply_care(pet, &toy.effect, 1, now, &rules.lifecycle, &mut rand::rng());

        Ok(Outcome::data(pet_view(pet, now, rules))
            .persist(PersistIntent::Player(player_id))
            .persist(PersistIntent::Pet(*pet_id)))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Release a pet. The pet is deleted, not refunded.
pub fn remove_pet(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::RemovePet { pet_id }) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        state.owned_pet(*pet_id, player_id)?;
        state.pets.remove(pet_id);
        let player = state.player_mut(player_id)?;
        player.owned_pet_count = player.owned_pet_count.saturating_sub(1);

        Ok(Outcome::data(json!({ "pet_id": pet_id }))
            .persist(PersistIntent::Player(player_id))
            .persist(PersistIntent::DeletePet {
                pet_id: *pet_id,
                owner: player_id,
            }))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Projected state of every pet the player owns. Nothing is committed.
pub fn pets_state(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    if !matches!(event.request(), Some(ActionRequest::PetsState)) {
        return Err(unexpected(event));
    }
    let player_id = event.origin.player_id;
    let state = ctx.store.state();

    let result = state.player(player_id).map(|_| {
        let pets: Vec<Value> = state
            .pets_of(player_id)
            .map(|pet| pet_view(pet, ctx.now, &ctx.rules))
            .collect();
        Outcome::data(json!({ "pets": pets }))
    });

    ctx.reply(event, result);
    Ok(())
}
