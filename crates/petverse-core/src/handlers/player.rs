//! Player feature: profile queries, income claims, settings, tutorial.

use petverse_events::{EventBusBuilder, HandlerError};
use petverse_pets::{GameError, lifecycle, project_stats, wallet};
use petverse_types::{ActionRequest, DomainEvent, EventName, MessageType, PetId, TutorialProgress};
use serde_json::{Value, json};
use tracing::debug;

use super::unexpected;
use crate::context::{Outcome, PersistIntent, RoomContext};
use crate::router::RouterBuilder;
use crate::validation;

/// Register the player routes.
pub fn routes(router: RouterBuilder) -> RouterBuilder {
    router
        .route(MessageType::RequestGameConfig, validation::request_game_config)
        .route(MessageType::RequestPlayerState, validation::request_player_state)
        .route(MessageType::GetProfile, validation::get_profile)
        .route(MessageType::ClaimDailyReward, validation::claim_daily_reward)
        .route(MessageType::UpdateSettings, validation::update_settings)
        .route(MessageType::UpdateTutorial, validation::update_tutorial)
}

/// Subscribe the player handlers.
pub fn subscribe(bus: EventBusBuilder<RoomContext>) -> EventBusBuilder<RoomContext> {
    bus.subscribe(
        EventName::requested(MessageType::RequestGameConfig),
        "player.config",
        game_config,
    )
    .subscribe(
        EventName::requested(MessageType::RequestPlayerState),
        "player.state",
        player_state,
    )
    .subscribe(
        EventName::requested(MessageType::GetProfile),
        "player.profile",
        profile,
    )
    .subscribe(
        EventName::requested(MessageType::ClaimDailyReward),
        "player.reward",
        claim_daily_reward,
    )
    .subscribe(
        EventName::requested(MessageType::UpdateSettings),
        "player.settings",
        update_settings,
    )
    .subscribe(
        EventName::requested(MessageType::UpdateTutorial),
        "player.tutorial",
        update_tutorial,
    )
}

/// Catalog and starting balance.
pub fn game_config(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    if !matches!(event.request(), Some(ActionRequest::GameConfig)) {
        return Err(unexpected(event));
    }

    let catalog = &ctx.rules.catalog;
    let data = json!({
        "starting_tokens": catalog.starting_tokens,
        "pet_types": catalog.pet_types,
        "items": catalog.items,
    });

    ctx.reply(event, Ok(Outcome::data(data)));
    Ok(())
}

/// The player document and projections of every owned pet.
pub fn player_state(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    if !matches!(event.request(), Some(ActionRequest::PlayerState)) {
        return Err(unexpected(event));
    }
    let player_id = event.origin.player_id;
    let state = ctx.store.state();

    let result = state.player(player_id).map(|player| {
        let pets: Vec<Value> = state
            .pets_of(player_id)
            .map(|pet| {
                json!({
                    "pet": pet,
                    "stats": project_stats(pet, ctx.now, &ctx.rules.lifecycle),
                })
            })
            .collect();
        Outcome::data(json!({ "player": player, "pets": pets }))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Public profile fields.
pub fn profile(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    if !matches!(event.request(), Some(ActionRequest::Profile)) {
        return Err(unexpected(event));
    }

    let result = ctx.store.state().player(event.origin.player_id).map(|p| {
        Outcome::data(json!({
            "id": p.id,
            "wallet": p.wallet,
            "display_name": p.display_name,
            "tokens": p.tokens,
            "owned_pet_count": p.owned_pet_count,
            "joined_at": p.joined_at,
            "tutorial": p.tutorial,
        }))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Claim accrued income from every owned pet and credit the total.
///
/// Fails with [`GameError::NoRewardAvailable`] when no pet has completed a
/// cycle.
pub fn claim_daily_reward(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    if !matches!(event.request(), Some(ActionRequest::ClaimDailyReward)) {
        return Err(unexpected(event));
    }
    let player_id = event.origin.player_id;
    let now = ctx.now;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        state.player(player_id)?;

        let mut total: u64 = 0;
        let mut paying: Vec<PetId> = Vec::new();
        for pet in state.pets.values_mut().filter(|p| p.owner_id == player_id) {
            let amount = lifecycle::claim_income(pet, now);
            if amount > 0 {
                total = total
                    .checked_add(amount)
                    .ok_or_else(|| GameError::ArithmeticOverflow {
                        context: String::from("reward total overflow"),
                    })?;
                paying.push(pet.id);
            }
        }
        if total == 0 {
            return Err(GameError::NoRewardAvailable);
        }

        let player = state.player_mut(player_id)?;
        wallet::credit(player, total)?;
        debug!(player_id = %player_id, total, pets = paying.len(), "income claimed");

        let outcome = Outcome::data(json!({
            "claimed": total,
            "tokens": player.tokens,
            "pets": paying,
        }))
        .persist(PersistIntent::Player(player_id));
        Ok(paying
            .iter()
            .fold(outcome, |o, id| o.persist(PersistIntent::Pet(*id))))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Apply the provided settings fields.
pub fn update_settings(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::UpdateSettings(patch)) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        let settings = &mut state.player_mut(player_id)?.settings;
        if let Some(v) = patch.sound_enabled {
            settings.sound_enabled = v;
        }
        if let Some(v) = patch.music_enabled {
            settings.music_enabled = v;
        }
        if let Some(v) = patch.notifications_enabled {
            settings.notifications_enabled = v;
        }
        if let Some(language) = &patch.language {
            settings.language.clone_from(language);
        }
        Ok(Outcome::data(json!({ "settings": settings }))
            .persist(PersistIntent::Player(player_id)))
    });

    ctx.reply(event, result);
    Ok(())
}

/// Record tutorial progress. A completed tutorial stays completed.
pub fn update_tutorial(event: &DomainEvent, ctx: &mut RoomContext) -> Result<(), HandlerError> {
    let Some(ActionRequest::UpdateTutorial { step, completed }) = event.request() else {
        return Err(unexpected(event));
    };
    let player_id = event.origin.player_id;

    let result = ctx.store.mutate(|state| -> Result<Outcome, GameError> {
        let player = state.player_mut(player_id)?;
        player.tutorial = TutorialProgress {
            step: *step,
            completed: player.tutorial.completed || *completed,
        };
        Ok(Outcome::data(json!({ "tutorial": player.tutorial }))
            .persist(PersistIntent::Player(player_id)))
    });

    ctx.reply(event, result);
    Ok(())
}
