//! Pet creation and ownership checks.

use chrono::{DateTime, Utc};
use petverse_types::{IncomeCycle, Pet, PetId, PetTypeDef, PlayerId, Stat};

use crate::error::GameError;

/// Create a newborn pet of the given catalog type with full stats.
pub fn create_pet(
    owner_id: PlayerId,
    def: &PetTypeDef,
    name: Option<String>,
    now: DateTime<Utc>,
) -> Pet {
    Pet {
        id: PetId::new(),
        owner_id,
        pet_type_id: def.id.clone(),
        name: name.unwrap_or_else(|| def.name.clone()),
        hunger: Stat::full(now),
        happiness: Stat::full(now),
        cleanliness: Stat::full(now),
        birth_time: now,
        growth_duration_secs: def.growth_duration_secs,
        is_adult: def.growth_duration_secs == 0,
        income: IncomeCycle {
            cycle_length_secs: def.income_cycle_secs,
            amount_per_cycle: def.income_per_cycle,
            last_claim: now,
        },
        waste: Vec::new(),
    }
}

/// Fail with [`GameError::NotPetOwner`] unless `player_id` owns the pet.
pub fn ensure_owner(pet: &Pet, player_id: PlayerId) -> Result<(), GameError> {
    if pet.owner_id == player_id {
        Ok(())
    } else {
        Err(GameError::NotPetOwner(pet.id))
    }
}
