//! Time-derived pet state.
//!
//! Pets are never ticked. Each stat stores the value it had at its own
//! `last_updated` instant and the present value is computed on demand:
//!
//! - `value(now) = clamp(stored - rate * minutes_since(last_updated), 0, 100)`
//! - status is `Exhausted` iff all three projected stats are zero
//! - adulthood is `stored_flag || now - birth_time >= growth_duration`
//! - claimable income is `floor(elapsed / cycle) * amount`, capped at one cycle
//!
//! [`project_stats`] is pure: reading never mutates. Callers that want to
//! persist a projection call [`commit`], which writes the projected values
//! and resets the stat timestamps.

use chrono::{DateTime, Utc};
use petverse_types::{ItemEffect, Pet, PetStatus, Position, Stat, WasteId, WasteObject};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::LifecycleConfig;
use crate::error::GameError;

/// Lower bound of every stat.
pub const STAT_MIN: f64 = 0.0;

/// Upper bound of every stat.
pub const STAT_MAX: f64 = 100.0;

/// A pet's present-time state, computed without mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedStats {
    /// Projected hunger.
    pub hunger: f64,
    /// Projected happiness.
    pub happiness: f64,
    /// Projected cleanliness.
    pub cleanliness: f64,
    /// Derived status.
    pub status: PetStatus,
    /// Whether the pet is an adult at projection time.
    pub is_adult: bool,
    /// Tokens that a claim at projection time would pay out.
    pub claimable_income: u64,
    /// Instant the projection was computed for.
    pub at: DateTime<Utc>,
}

/// What a [`commit`] changed beyond the stat values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitOutcome {
    /// The pet became an adult with this commit.
    pub became_adult: bool,
    /// Waste dropped because hunger or cleanliness crossed the threshold.
    pub spawned_waste: Option<WasteObject>,
}

/// Clamp a stat into `[0, 100]`. `NaN` collapses to zero.
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Minutes elapsed from `from` to `to`. Negative spans (clock skew) are zero.
#[allow(clippy::cast_precision_loss)]
fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = to.signed_duration_since(from).num_milliseconds().max(0);
    millis as f64 / 60_000.0
}

/// Whole seconds elapsed from `from` to `to`. Negative spans are zero.
fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from(to.signed_duration_since(from).num_seconds()).unwrap_or(0)
}

/// Project one stat to `now` with the given per-minute decay rate.
pub fn decay(stat: &Stat, rate_per_minute: f64, now: DateTime<Utc>) -> f64 {
    let lost = rate_per_minute.max(0.0) * elapsed_minutes(stat.last_updated, now);
    clamp_stat(stat.value - lost)
}

/// Status is a pure function of the three stats.
pub fn derive_status(hunger: f64, happiness: f64, cleanliness: f64) -> PetStatus {
    if hunger <= STAT_MIN && happiness <= STAT_MIN && cleanliness <= STAT_MIN {
        PetStatus::Exhausted
    } else {
        PetStatus::Active
    }
}

/// Whether the pet is an adult at `now`.
pub fn is_mature(pet: &Pet, now: DateTime<Utc>) -> bool {
    pet.is_adult || elapsed_secs(pet.birth_time, now) >= pet.growth_duration_secs
}

/// Income claimable at `now`, never more than one cycle's amount.
pub fn claimable_income(pet: &Pet, now: DateTime<Utc>) -> u64 {
    let income = &pet.income;
    let cycles = elapsed_secs(income.last_claim, now)
        .checked_div(income.cycle_length_secs)
        .unwrap_or(0);
    cycles
        .saturating_mul(income.amount_per_cycle)
        .min(income.amount_per_cycle)
}

/// Compute the present-time state of `pet` without touching it.
pub fn project_stats(pet: &Pet, now: DateTime<Utc>, config: &LifecycleConfig) -> ProjectedStats {
    let hunger = decay(&pet.hunger, config.hunger_decay_per_minute, now);
    let happiness = decay(&pet.happiness, config.happiness_decay_per_minute, now);
    let cleanliness = decay(&pet.cleanliness, config.cleanliness_decay_per_minute, now);

    ProjectedStats {
        hunger,
        happiness,
        cleanliness,
        status: derive_status(hunger, happiness, cleanliness),
        is_adult: is_mature(pet, now),
        claimable_income: claimable_income(pet, now),
        at: now,
    }
}

/// Write a projection back onto the pet.
///
/// Stat values are clamped again on the way in, all three stat timestamps
/// move to `now`, adulthood is latched, and waste is dropped when
/// hunger or cleanliness crosses `waste_threshold` from above.
pub fn commit(
    pet: &mut Pet,
    projection: &ProjectedStats,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
    rng: &mut impl Rng,
) -> CommitOutcome {
    let mut outcome = CommitOutcome::default();

    let threshold = config.waste_threshold;
    let crossed = |before: f64, after: f64| before > threshold && after <= threshold;
    let hunger = clamp_stat(projection.hunger);
    let cleanliness = clamp_stat(projection.cleanliness);
    let drops_waste =
        crossed(pet.hunger.value, hunger) || crossed(pet.cleanliness.value, cleanliness);

    pet.hunger = Stat {
        value: hunger,
        last_updated: now,
    };
    pet.happiness = Stat {
        value: clamp_stat(projection.happiness),
        last_updated: now,
    };
    pet.cleanliness = Stat {
        value: cleanliness,
        last_updated: now,
    };

    if projection.is_adult && !pet.is_adult {
        pet.is_adult = true;
        outcome.became_adult = true;
        debug!(pet_id = %pet.id, "pet reached adulthood");
    }

    if drops_waste && pet.waste.len() < config.max_waste_per_pet {
        let size = play_area(config);
        let waste = WasteObject {
            id: WasteId::new(),
            pet_id: pet.id,
            position: Position {
                x: rng.random_range(0.0..size),
                y: rng.random_range(0.0..size),
            },
        };
        pet.waste.push(waste);
        outcome.spawned_waste = Some(waste);
        debug!(pet_id = %pet.id, waste_id = %waste.id, "pet dropped waste");
    }

    outcome
}

/// Side length of the square waste is scattered over. Values that are not
/// finite or below one fall back to the default area.
fn play_area(config: &LifecycleConfig) -> f32 {
    let size = config.play_area_size;
    if size.is_finite() && size >= 1.0 {
        size
    } else {
        LifecycleConfig::default().play_area_size
    }
}

/// Project then commit in one step.
pub fn refresh(
    pet: &mut Pet,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
    rng: &mut impl Rng,
) -> CommitOutcome {
    let projection = project_stats(pet, now, config);
    commit(pet, &projection, now, config, rng)
}

/// Bring the pet up to date, then add an item's stat effect.
///
/// `units` multiplies the effect (feeding three apples).
pub fn apply_care(
    pet: &mut Pet,
    effect: &ItemEffect,
    units: u32,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
    rng: &mut impl Rng,
) -> CommitOutcome {
    let outcome = refresh(pet, now, config, rng);
    let units = f64::from(units);
    pet.hunger.value = clamp_stat(pet.hunger.value + effect.hunger * units);
    pet.happiness.value = clamp_stat(pet.happiness.value + effect.happiness * units);
    pet.cleanliness.value = clamp_stat(pet.cleanliness.value + effect.cleanliness * units);
    outcome
}

/// Claim accrued income.
///
/// Returns the amount paid out and resets `last_claim` to `now` when it is
/// non-zero. Any partial cycle beyond the cap is forfeited.
pub fn claim_income(pet: &mut Pet, now: DateTime<Utc>) -> u64 {
    let amount = claimable_income(pet, now);
    if amount > 0 {
        pet.income.last_claim = now;
    }
    amount
}

/// Remove waste and restore cleanliness.
///
/// With `waste_id` set only that object is removed; otherwise all waste is
/// cleared. Returns the number of waste objects removed.
pub fn clean(
    pet: &mut Pet,
    waste_id: Option<WasteId>,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
    rng: &mut impl Rng,
) -> Result<usize, GameError> {
    if let Some(id) = waste_id
        && !pet.waste.iter().any(|w| w.id == id)
    {
        return Err(GameError::WasteNotFound(id));
    }

    refresh(pet, now, config, rng);

    let before = pet.waste.len();
    match waste_id {
        Some(id) => pet.waste.retain(|w| w.id != id),
        None => pet.waste.clear(),
    }
    let removed = before.saturating_sub(pet.waste.len());

    pet.cleanliness.value = clamp_stat(pet.cleanliness.value + config.clean_restore);
    Ok(removed)
}
