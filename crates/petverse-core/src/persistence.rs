//! Persistence port consumed by session rooms.
//!
//! Rooms read players and pets on join and write them back after each
//! state-changing action and on close. No transaction semantics are
//! assumed beyond single-document atomicity. [`MemoryPersistence`] backs
//! local development and tests; `petverse-db` provides the Dragonfly
//! implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use petverse_types::{Pet, PetId, Player, PlayerId};
use tokio::sync::RwLock;

/// Errors surfaced by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The backend could not be reached.
    #[error("persistence unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be encoded or decoded.
    #[error("persistence serialization error: {0}")]
    Serialization(String),

    /// The backend rejected the operation.
    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Player and pet storage.
#[async_trait]
pub trait PersistencePort: Send + Sync {
    /// Load a player by id.
    async fn load_player(&self, id: PlayerId) -> Result<Option<Player>, PersistenceError>;

    /// Load a player by wallet address.
    async fn load_player_by_wallet(&self, wallet: &str)
    -> Result<Option<Player>, PersistenceError>;

    /// Insert or replace a player.
    async fn save_player(&self, player: &Player) -> Result<(), PersistenceError>;

    /// Load every pet owned by `owner`.
    async fn load_pets_for_owner(&self, owner: PlayerId) -> Result<Vec<Pet>, PersistenceError>;

    /// Insert or replace a pet.
    async fn save_pet(&self, pet: &Pet) -> Result<(), PersistenceError>;

    /// Remove a pet.
    async fn delete_pet(&self, id: PetId, owner: PlayerId) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default)]
struct MemoryTables {
    players: HashMap<PlayerId, Player>,
    wallets: HashMap<String, PlayerId>,
    pets: HashMap<PetId, Pet>,
}

/// In-process persistence. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    tables: RwLock<MemoryTables>,
}

impl MemoryPersistence {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored players.
    pub async fn player_count(&self) -> usize {
        self.tables.read().await.players.len()
    }

    /// Number of stored pets.
    pub async fn pet_count(&self) -> usize {
        self.tables.read().await.pets.len()
    }
}

#[async_trait]
impl PersistencePort for MemoryPersistence {
    async fn load_player(&self, id: PlayerId) -> Result<Option<Player>, PersistenceError> {
        Ok(self.tables.read().await.players.get(&id).cloned())
    }

    async fn load_player_by_wallet(
        &self,
        wallet: &str,
    ) -> Result<Option<Player>, PersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .wallets
            .get(wallet)
            .and_then(|id| tables.players.get(id))
            .cloned())
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistenceError> {
        let mut tables = self.tables.write().await;
        tables.wallets.insert(player.wallet.clone(), player.id);
        tables.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn load_pets_for_owner(&self, owner: PlayerId) -> Result<Vec<Pet>, PersistenceError> {
        let tables = self.tables.read().await;
        let mut pets: Vec<Pet> = tables
            .pets
            .values()
            .filter(|p| p.owner_id == owner)
            .cloned()
            .collect();
        pets.sort_by_key(|p| p.id);
        Ok(pets)
    }

    async fn save_pet(&self, pet: &Pet) -> Result<(), PersistenceError> {
        self.tables.write().await.pets.insert(pet.id, pet.clone());
        Ok(())
    }

    async fn delete_pet(&self, id: PetId, _owner: PlayerId) -> Result<(), PersistenceError> {
        self.tables.write().await.pets.remove(&id);
        Ok(())
    }
}
