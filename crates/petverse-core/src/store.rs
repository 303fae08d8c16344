//! Authoritative in-memory state for one session.
//!
//! The store is owned by its room task, and [`ReplicatedStateStore::mutate`]
//! takes `&mut self`, so two mutations of the same session can never
//! interleave. A transition either commits in full (and is broadcast to
//! every connected client as a patch) or is rolled back before anything
//! is observable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use petverse_types::{SessionId, StateUpdate};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::serializer;
use crate::state::SessionState;

/// Capacity of the per-session state broadcast channel.
///
/// A client that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and must resync from a full
/// snapshot.
const BROADCAST_CAPACITY: usize = 256;

/// Replicated state for one session.
pub struct ReplicatedStateStore {
    state: SessionState,
    published: Arc<SessionState>,
    encoded: Value,
    version: u64,
    tx: broadcast::Sender<StateUpdate>,
}

impl std::fmt::Debug for ReplicatedStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicatedStateStore")
            .field("session_id", &self.state.session_id)
            .field("version", &self.version)
            .field("players", &self.state.players.len())
            .field("pets", &self.state.pets.len())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

impl ReplicatedStateStore {
    /// An empty store at version 0.
    pub fn new(session_id: SessionId, created_at: DateTime<Utc>) -> Self {
        let state = SessionState::new(session_id, created_at);
        let encoded = serializer::encode(&state).unwrap_or(Value::Null);
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            published: Arc::new(state.clone()),
            state,
            encoded,
            version: 0,
            tx,
        }
    }

    /// Read access to the committed tree.
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// An immutable view of the last committed tree.
    pub fn snapshot(&self) -> Arc<SessionState> {
        Arc::clone(&self.published)
    }

    /// Number of committed mutations.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Full encoding of the committed tree, for newly joined clients.
    pub fn full_update(&self) -> StateUpdate {
        StateUpdate::State {
            version: self.version,
            state: self.encoded.clone(),
        }
    }

    /// Receive every update committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.tx.subscribe()
    }

    /// Run a state transition.
    ///
    /// On `Err` the tree is restored to its pre-call value and the error is
    /// returned; nothing is broadcast. On `Ok` the version is bumped and a
    /// patch describing the change is broadcast.
    pub fn mutate<T, E, F>(&mut self, transition: F) -> Result<T, E>
    where
        F: FnOnce(&mut SessionState) -> Result<T, E>,
    {
        let before = self.state.clone();
        match transition(&mut self.state) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(e) => {
                self.state = before;
                debug!(session_id = %self.state.session_id, "mutation rolled back");
                Err(e)
            }
        }
    }

    fn commit(&mut self) {
        self.version = self.version.saturating_add(1);
        self.published = Arc::new(self.state.clone());

        let encoded = match serializer::encode(&self.state) {
            Ok(v) => v,
            Err(e) => {
                error!(
                    session_id = %self.state.session_id,
                    error = %e,
                    "failed to encode session state, sending full resync"
                );
                Value::Null
            }
        };

        let update = if encoded.is_null() {
            StateUpdate::State {
                version: self.version,
                state: encoded.clone(),
            }
        } else {
            StateUpdate::StatePatch {
                version: self.version,
                ops: serializer::diff(&self.encoded, &encoded),
            }
        };
        self.encoded = encoded;

        let receivers = self.tx.send(update).unwrap_or(0);
        debug!(
            session_id = %self.state.session_id,
            version = self.version,
            receivers = receivers,
            "state committed"
        );
    }
}

#[cfg(test)]
mod tests {
    use petverse_pets::GameError;
    use petverse_types::{Player, PlayerIdentity};

    use super::*;

    fn store() -> ReplicatedStateStore {
        ReplicatedStateStore::new(SessionId::new(), Utc::now())
    }

    fn add_player(state: &mut SessionState, tokens: u64) -> Player {
        let identity = PlayerIdentity {
            wallet: String::from("0x42"),
            display_name: String::from("Lu"),
        };
        let player = Player::new(&identity, tokens, Utc::now());
        state.players.insert(player.id, player.clone());
        player
    }

    #[test]
    fn successful_mutation_bumps_version_and_broadcasts() {
        let mut store = store();
        let mut rx = store.subscribe();
        let result: Result<Player, GameError> = store.mutate(|s| Ok(add_player(s, 10)));
        assert!(result.is_ok());
        assert_eq!(store.version(), 1);
        assert_eq!(store.snapshot().players.len(), 1);

        let update = rx.try_recv();
        assert!(matches!(
            update,
            Ok(StateUpdate::StatePatch { version: 1, ref ops }) if ops.len() == 1
        ));
    }

    #[test]
    fn failed_mutation_rolls_back_without_broadcast() {
        let mut store = store();
        let created: Result<Player, GameError> = store.mutate(|s| Ok(add_player(s, 10)));
        let player_id = created.map(|p| p.id).unwrap_or_default();
        let before = store.snapshot();
        let mut rx = store.subscribe();

        let result: Result<(), GameError> = store.mutate(|s| {
            let player = s.player_mut(player_id)?;
            player.tokens = 0;
            Err(GameError::NoRewardAvailable)
        });

        assert_eq!(result, Err(GameError::NoRewardAvailable));
        assert_eq!(*store.snapshot(), *before);
        assert_eq!(store.state(), &*before);
        assert_eq!(store.version(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let mut store = store();
        let old = store.snapshot();
        let _: Result<Player, GameError> = store.mutate(|s| Ok(add_player(s, 1)));
        assert!(old.players.is_empty());
        assert_eq!(store.snapshot().players.len(), 1);
    }

    #[test]
    fn full_update_carries_current_version() {
        let mut store = store();
        let _: Result<Player, GameError> = store.mutate(|s| Ok(add_player(s, 1)));
        assert_eq!(store.full_update().version(), 1);
    }
}
