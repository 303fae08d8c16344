//! The replicated state tree for one session.
//!
//! Plain data only. The tree is walked by [`crate::serializer`] for
//! broadcast and mutated exclusively through
//! [`ReplicatedStateStore::mutate`](crate::store::ReplicatedStateStore::mutate).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use petverse_pets::GameError;
use petverse_types::{Pet, PetId, Player, PlayerId, SessionId};

/// Everything a session replicates to its clients.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Session identifier.
    pub session_id: SessionId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Players that have joined, keyed by id.
    pub players: BTreeMap<PlayerId, Player>,
    /// Pets owned by those players, keyed by id.
    pub pets: BTreeMap<PetId, Pet>,
}

impl SessionState {
    /// An empty tree.
    pub const fn new(session_id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            created_at,
            players: BTreeMap::new(),
            pets: BTreeMap::new(),
        }
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players.get(&id).ok_or(GameError::PlayerNotFound(id))
    }

    /// Look up a player for mutation.
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players.get_mut(&id).ok_or(GameError::PlayerNotFound(id))
    }

    /// Find a player by wallet address.
    pub fn player_by_wallet(&self, wallet: &str) -> Option<&Player> {
        self.players.values().find(|p| p.wallet == wallet)
    }

    /// Look up a pet owned by `owner`.
    pub fn owned_pet(&self, id: PetId, owner: PlayerId) -> Result<&Pet, GameError> {
        let pet = self.pets.get(&id).ok_or(GameError::PetNotFound(id))?;
        petverse_pets::pet::ensure_owner(pet, owner)?;
        Ok(pet)
    }

    /// Look up a pet owned by `owner` for mutation.
    pub fn owned_pet_mut(&mut self, id: PetId, owner: PlayerId) -> Result<&mut Pet, GameError> {
        let pet = self.pets.get_mut(&id).ok_or(GameError::PetNotFound(id))?;
        petverse_pets::pet::ensure_owner(pet, owner)?;
        Ok(pet)
    }

    /// Pets owned by `owner`, in id order.
    pub fn pets_of(&self, owner: PlayerId) -> impl Iterator<Item = &Pet> {
        self.pets.values().filter(move |p| p.owner_id == owner)
    }
}

#[cfg(test)]
mod tests {
    use petverse_types::PlayerIdentity;

    use super::*;

    #[test]
    fn lookups_report_missing_entities() {
        let state = SessionState::new(SessionId::new(), Utc::now());
        let missing = PlayerId::new();
        assert_eq!(state.player(missing), Err(GameError::PlayerNotFound(missing)));
        let pet = PetId::new();
        assert_eq!(
            state.owned_pet(pet, missing),
            Err(GameError::PetNotFound(pet))
        );
    }

    #[test]
    fn finds_player_by_wallet() {
        let mut state = SessionState::new(SessionId::new(), Utc::now());
        let identity = PlayerIdentity {
            wallet: String::from("0xfeed"),
            display_name: String::from("Kai"),
        };
        let player = Player::new(&identity, 10, Utc::now());
        let id = player.id;
        state.players.insert(id, player);
        assert_eq!(state.player_by_wallet("0xfeed").map(|p| p.id), Some(id));
        assert!(state.player_by_wallet("0xbeef").is_none());
    }
}
