//! [`PersistencePort`] backed by `Dragonfly`.
//!
//! Each player and pet is stored as one JSON document, so every write is
//! single-key atomic. The wallet index and the per-owner pet set are
//! secondary keys updated after the document; a reader that finds a stale
//! index entry skips it.

use async_trait::async_trait;
use petverse_core::{PersistenceError, PersistencePort};
use petverse_types::{Pet, PetId, Player, PlayerId};
use tracing::{debug, warn};

use crate::dragonfly::{DragonflyPool, owned_pets_key, pet_key, player_key, wallet_key};
use crate::error::DbError;

/// Player and pet storage in `Dragonfly`.
#[derive(Clone)]
pub struct DragonflyPersistence {
    pool: DragonflyPool,
}

impl DragonflyPersistence {
    /// Wrap a connected pool.
    pub const fn new(pool: DragonflyPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and wrap the pool.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        Ok(Self::new(DragonflyPool::connect(url).await?))
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &DragonflyPool {
        &self.pool
    }

    async fn player(&self, id: PlayerId) -> Result<Option<Player>, DbError> {
        self.pool.get_json(&player_key(id)).await
    }

    async fn player_by_wallet(&self, wallet: &str) -> Result<Option<Player>, DbError> {
        let key = wallet_key(wallet);
        let Some(raw) = self.pool.get_str(&key).await? else {
            return Ok(None);
        };
        let id: PlayerId = raw.parse().map_err(|e| DbError::Corrupt {
            key,
            message: format!("not a player id: {e}"),
        })?;

        let player = self.player(id).await?;
        if player.is_none() {
            warn!(wallet, player_id = %id, "wallet index points at a missing player");
        }
        Ok(player)
    }

    async fn store_player(&self, player: &Player) -> Result<(), DbError> {
        self.pool.set_json(&player_key(player.id), player).await?;
        self.pool
            .set_str(&wallet_key(&player.wallet), &player.id.to_string())
            .await
    }

    async fn pets_of(&self, owner: PlayerId) -> Result<Vec<Pet>, DbError> {
        let key = owned_pets_key(owner);
        let members = self.pool.members(&key).await?;

        let mut pets = Vec::with_capacity(members.len());
        for member in &members {
            let id: PetId = member.parse().map_err(|e| DbError::Corrupt {
                key: key.clone(),
                message: format!("not a pet id: {e}"),
            })?;
            match self.pool.get_json::<Pet>(&pet_key(id)).await? {
                Some(pet) if pet.owner_id == owner => pets.push(pet),
                Some(_) | None => {
                    debug!(owner = %owner, pet_id = %id, "skipping stale pet index entry");
                }
            }
        }
        pets.sort_by_key(|p| p.id);
        Ok(pets)
    }

    async fn store_pet(&self, pet: &Pet) -> Result<(), DbError> {
        self.pool.set_json(&pet_key(pet.id), pet).await?;
        self.pool
            .add_member(&owned_pets_key(pet.owner_id), &pet.id.to_string())
            .await
    }

    async fn remove_pet(&self, id: PetId, owner: PlayerId) -> Result<(), DbError> {
        self.pool.delete(&pet_key(id)).await?;
        self.pool
            .remove_member(&owned_pets_key(owner), &id.to_string())
            .await
    }
}

#[async_trait]
impl PersistencePort for DragonflyPersistence {
    async fn load_player(&self, id: PlayerId) -> Result<Option<Player>, PersistenceError> {
        Ok(self.player(id).await?)
    }

    async fn load_player_by_wallet(
        &self,
        wallet: &str,
    ) -> Result<Option<Player>, PersistenceError> {
        Ok(self.player_by_wallet(wallet).await?)
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistenceError> {
        Ok(self.store_player(player).await?)
    }

    async fn load_pets_for_owner(&self, owner: PlayerId) -> Result<Vec<Pet>, PersistenceError> {
        Ok(self.pets_of(owner).await?)
    }

    async fn save_pet(&self, pet: &Pet) -> Result<(), PersistenceError> {
        Ok(self.store_pet(pet).await?)
    }

    async fn delete_pet(&self, id: PetId, owner: PlayerId) -> Result<(), PersistenceError> {
        Ok(self.remove_pet(id, owner).await?)
    }
}
