//! Live session lookup.
//!
//! The [`SessionRegistry`] maps session ids to room handles, spawning rooms
//! on first use and forgetting them once they close. Every spawned room is
//! paired with a small watcher task that drops the room's entry when its
//! task ends, so rooms closed by their grace timer do not accumulate. It is
//! the only shared mutable structure in the engine; rooms themselves never
//! share state.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use futures::future::join_all;
use petverse_types::SessionId;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::room::{RoomDeps, RoomHandle, RoomInfo, SessionRoom};

/// Session id to running room.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    deps: RoomDeps,
    rooms: Arc<RwLock<HashMap<SessionId, RoomHandle>>>,
}

impl SessionRegistry {
    /// An empty registry that spawns rooms with `deps`.
    pub fn new(deps: RoomDeps) -> Self {
        Self {
            deps,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The room for `session_id`, started if absent or closed.
    pub async fn get_or_create(&self, session_id: SessionId) -> RoomHandle {
        if let Some(handle) = self.get(session_id).await {
            return handle;
        }

        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(&session_id).filter(|h| !h.is_closed()) {
            return handle.clone();
        }

        let (handle, task) = SessionRoom::spawn(session_id, self.deps.clone());
        rooms.insert(session_id, handle.clone());
        debug!(session_id = %session_id, rooms = rooms.len(), "room registered");
        tokio::spawn(forget_when_done(
            Arc::downgrade(&self.rooms),
            session_id,
            task,
        ));
        handle
    }

    /// The running room for `session_id`, if any.
    pub async fn get(&self, session_id: SessionId) -> Option<RoomHandle> {
        self.rooms
            .read()
            .await
            .get(&session_id)
            .filter(|h| !h.is_closed())
            .cloned()
    }

    /// Number of registered rooms, including any closed room whose entry
    /// has not been dropped yet.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Whether no room is registered.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Summaries of every running room, in session id order.
    pub async fn list(&self) -> Vec<RoomInfo> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        let mut infos: Vec<RoomInfo> = join_all(handles.iter().map(RoomHandle::info))
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        infos.sort_by_key(|i| i.session_id);
        infos
    }

    /// Drop handles of rooms that have closed. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, h| !h.is_closed());
        let removed = before.saturating_sub(rooms.len());
        if removed > 0 {
            debug!(removed, remaining = rooms.len(), "pruned closed rooms");
        }
        removed
    }

    /// Close every room, flushing their players.
    pub async fn shutdown_all(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        info!(rooms = handles.len(), "shutting down all session rooms");

        let results = join_all(handles.iter().map(RoomHandle::shutdown)).await;
        for (handle, result) in handles.iter().zip(results) {
            if let Err(e) = result {
                warn!(session_id = %handle.session_id(), error = %e, "room already closed");
            }
        }
    }
}

/// Wait for a room task to end, then drop its entry if it is still the
/// closed room. A newer room registered under the same id is left alone.
async fn forget_when_done(
    rooms: Weak<RwLock<HashMap<SessionId, RoomHandle>>>,
    session_id: SessionId,
    task: JoinHandle<()>,
) {
    if let Err(e) = task.await {
        warn!(session_id = %session_id, error = %e, "room task ended abnormally");
    }
    let Some(rooms) = rooms.upgrade() else {
        return;
    };
    let mut rooms = rooms.write().await;
    if rooms.get(&session_id).is_some_and(RoomHandle::is_closed) {
        rooms.remove(&session_id);
        debug!(session_id = %session_id, remaining = rooms.len(), "closed room forgotten");
    }
}
