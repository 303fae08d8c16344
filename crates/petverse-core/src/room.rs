//! Session room actor.
//!
//! Each session runs as one Tokio task that owns its [`RoomContext`] and
//! therefore its replicated store. Transports talk to the task through a
//! cloneable [`RoomHandle`]; commands are queued on an `mpsc` channel and
//! handled strictly one at a time, so messages from one session are
//! processed in arrival order and never interleave.
//!
//! Lifecycle:
//!
//! - `Created` until the first successful join
//! - `Active` while at least one client is connected
//! - `Draining` once the last client leaves; a rejoin before the grace
//!   period runs out returns the room to `Active`
//! - `Closed` when the grace period expires with nobody connected, on
//!   [`RoomHandle::shutdown`], or when every handle is dropped. Players
//!   with unsaved changes are flushed to persistence and the store is
//!   discarded.
//!
//! A room that never sees a successful join also closes after one grace
//! period.
//!
//! Every state-changing action is written through as part of its response.
//! A player only becomes dirty when such a write fails; leave and close
//! flush dirty players and nobody else, so a room never writes back a copy
//! that another session may have moved past since.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use petverse_events::{DomainEventBus, PublishOptions, RetryExecutor};
use petverse_pets::GameError;
use petverse_types::{
    ClientId, DomainEvent, EventOrigin, InboundMessage, OutboundMessage, PetId, Player, PlayerId,
    PlayerIdentity, ResponseEnvelope, SessionId, StateUpdate,
};
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::GameRules;
use crate::context::{PersistIntent, Reply, RoomContext};
use crate::error::RoomError;
use crate::persistence::{PersistenceError, PersistencePort};
use crate::router::{DispatchOutcome, MessageRouter};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything a room needs from the outside world.
#[derive(Clone)]
pub struct RoomDeps {
    /// Shared event bus with every feature's handlers subscribed.
    pub bus: Arc<DomainEventBus<RoomContext>>,
    /// Shared message router.
    pub router: Arc<MessageRouter>,
    /// Policy for persistence calls.
    pub retry: RetryExecutor,
    /// Player and pet storage.
    pub persistence: Arc<dyn PersistencePort>,
    /// Catalog and lifecycle values.
    pub rules: Arc<GameRules>,
    /// Game time source.
    pub clock: Arc<dyn Clock>,
    /// How long an empty room waits for a rejoin.
    pub grace_period: Duration,
    /// Per-client outbound buffer.
    pub outbound_buffer: usize,
    /// Room command queue depth.
    pub command_buffer: usize,
}

impl std::fmt::Debug for RoomDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDeps")
            .field("bus", &self.bus)
            .field("router", &self.router)
            .field("retry", &self.retry)
            .field("grace_period", &self.grace_period)
            .field("outbound_buffer", &self.outbound_buffer)
            .field("command_buffer", &self.command_buffer)
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// No client has joined yet.
    Created,
    /// At least one client is connected.
    Active,
    /// Empty, waiting out the grace period.
    Draining,
    /// Flushed and stopped.
    Closed,
}

/// Summary of a room for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    /// Session id.
    pub session_id: SessionId,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Connected clients.
    pub clients: usize,
    /// Players in the replicated state.
    pub players: usize,
    /// Pets in the replicated state.
    pub pets: usize,
    /// Store version.
    pub version: u64,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
}

/// Everything a newly joined client needs.
#[derive(Debug)]
pub struct JoinTicket {
    /// Session joined.
    pub session_id: SessionId,
    /// Id assigned to this connection.
    pub client_id: ClientId,
    /// Player the connection acts as.
    pub player_id: PlayerId,
    /// Full state at join time.
    pub snapshot: StateUpdate,
    /// `*_response` messages addressed to this client.
    pub outbound: mpsc::Receiver<OutboundMessage>,
    /// State updates committed after `snapshot`.
    pub updates: broadcast::Receiver<StateUpdate>,
}

enum Command {
    Join {
        identity: PlayerIdentity,
        reply: oneshot::Sender<Result<JoinTicket, RoomError>>,
    },
    Leave {
        client_id: ClientId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Message {
        client_id: ClientId,
        message: InboundMessage,
        reply: oneshot::Sender<Result<DispatchOutcome, RoomError>>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    FullState {
        reply: oneshot::Sender<StateUpdate>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    session_id: SessionId,
    tx: mpsc::Sender<Command>,
    status: watch::Receiver<RoomStatus>,
}

impl RoomHandle {
    /// Session this handle addresses.
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RoomStatus {
        *self.status.borrow()
    }

    /// Whether the room has closed.
    pub fn is_closed(&self) -> bool {
        self.status() == RoomStatus::Closed || self.tx.is_closed()
    }

    /// Wait until the room reaches `status`.
    pub async fn wait_for(&self, status: RoomStatus) -> Result<(), RoomError> {
        let mut rx = self.status.clone();
        rx.wait_for(|s| *s == status)
            .await
            .map(|_| ())
            .map_err(|_closed| RoomError::Closed(self.session_id))
    }

    /// Join as `identity`.
    pub async fn join(&self, identity: PlayerIdentity) -> Result<JoinTicket, RoomError> {
        self.request(|reply| Command::Join { identity, reply })
            .await?
    }

    /// Disconnect a client. Its player stays in the session.
    pub async fn leave(&self, client_id: ClientId) -> Result<(), RoomError> {
        self.request(|reply| Command::Leave { client_id, reply })
            .await?
    }

    /// Route an inbound message from a joined client.
    ///
    /// Returns once the message has been handled and any responses queued.
    pub async fn send(
        &self,
        client_id: ClientId,
        message: InboundMessage,
    ) -> Result<DispatchOutcome, RoomError> {
        self.request(|reply| Command::Message {
            client_id,
            message,
            reply,
        })
        .await?
    }

    /// Room summary.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| Command::Info { reply }).await
    }

    /// Full encoding of the current state.
    pub async fn full_state(&self) -> Result<StateUpdate, RoomError> {
        self.request(|reply| Command::FullState { reply }).await
    }

    /// Flush and close the room now.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_send_err| RoomError::Closed(self.session_id))?;
        rx.await.map_err(|_recv_err| RoomError::Closed(self.session_id))
    }
}

// ---------------------------------------------------------------------------
// Room task
// ---------------------------------------------------------------------------

struct ClientSlot {
    player_id: PlayerId,
    outbound: mpsc::Sender<OutboundMessage>,
}

/// The room actor. Created with [`SessionRoom::spawn`].
pub struct SessionRoom {
    session_id: SessionId,
    deps: RoomDeps,
    ctx: RoomContext,
    clients: HashMap<ClientId, ClientSlot>,
    status: watch::Sender<RoomStatus>,
    deadline: Option<Instant>,
    /// Players whose in-memory copy is ahead of persistence.
    dirty: HashSet<PlayerId>,
    /// Pet deletions that failed to reach persistence, by owner.
    pending_deletes: HashSet<(PlayerId, PetId)>,
}

impl SessionRoom {
    /// Start a room task for `session_id`.
    pub fn spawn(session_id: SessionId, deps: RoomDeps) -> (RoomHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(deps.command_buffer.max(1));
        let (status, status_rx) = watch::channel(RoomStatus::Created);
        let ctx = RoomContext::new(session_id, deps.clock.now(), Arc::clone(&deps.rules));
        let deadline = Instant::now().checked_add(deps.grace_period);

        let room = Self {
            session_id,
            deps,
            ctx,
            clients: HashMap::new(),
            status,
            deadline,
            dirty: HashSet::new(),
            pending_deletes: HashSet::new(),
        };
        let task = tokio::spawn(room.run(rx));
        info!(session_id = %session_id, "session room started");

        let handle = RoomHandle {
            session_id,
            tx,
            status: status_rx,
        };
        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        info!(session_id = %self.session_id, "session shutdown requested");
                        self.close().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        debug!(session_id = %self.session_id, "all room handles dropped");
                        self.close().await;
                        break;
                    }
                },
                () = sleep_until(deadline), if deadline.is_some() => {
                    if self.clients.is_empty() {
                        info!(session_id = %self.session_id, "grace period expired");
                        self.close().await;
                        break;
                    }
                    self.deadline = None;
                }
            }
        }
        rx.close();
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Join { identity, reply } => {
                let result = self.join(identity).await;
                let _ = reply.send(result);
            }
            Command::Leave { client_id, reply } => {
                let result = self.leave(client_id).await;
                let _ = reply.send(result);
            }
            Command::Message {
                client_id,
                message,
                reply,
            } => {
                let result = self.dispatch(client_id, &message).await;
                let _ = reply.send(result);
            }
            Command::Info { reply } => {
                let _ = reply.send(self.info());
            }
            Command::FullState { reply } => {
                let _ = reply.send(self.ctx.store.full_update());
            }
            Command::Shutdown { reply } => {
                // Handled in `run`; never reaches here.
                let _ = reply.send(());
            }
        }
    }

    fn set_status(&mut self, status: RoomStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            info!(
                session_id = %self.session_id,
                from = ?previous,
                to = ?status,
                "session status changed"
            );
        }
    }

    fn info(&self) -> RoomInfo {
        let state = self.ctx.store.state();
        RoomInfo {
            session_id: self.session_id,
            status: *self.status.borrow(),
            clients: self.clients.len(),
            players: state.players.len(),
            pets: state.pets.len(),
            version: self.ctx.store.version(),
            created_at: state.created_at,
        }
    }

    // -----------------------------------------------------------------------
    // Join / leave
    // -----------------------------------------------------------------------

    async fn join(&mut self, identity: PlayerIdentity) -> Result<JoinTicket, RoomError> {
        let existing = self
            .ctx
            .store
            .state()
            .player_by_wallet(&identity.wallet)
            .map(|p| p.id);
        let player_id = match existing {
            Some(id) => id,
            None => self.admit(&identity).await?,
        };

        let client_id = ClientId::new();
        let (outbound_tx, outbound) = mpsc::channel(self.deps.outbound_buffer.max(1));
        let updates = self.ctx.store.subscribe();
        let snapshot = self.ctx.store.full_update();
        self.clients.insert(
            client_id,
            ClientSlot {
                player_id,
                outbound: outbound_tx,
            },
        );

        self.deadline = None;
        self.set_status(RoomStatus::Active);
        info!(
            session_id = %self.session_id,
            client_id = %client_id,
            player_id = %player_id,
            clients = self.clients.len(),
            "client joined"
        );

        Ok(JoinTicket {
            session_id: self.session_id,
            client_id,
            player_id,
            snapshot,
            outbound,
            updates,
        })
    }

    /// Bring a player into the session: loaded from persistence if known,
    /// otherwise created with the starting balance.
    async fn admit(&mut self, identity: &PlayerIdentity) -> Result<PlayerId, RoomError> {
        let persistence = &self.deps.persistence;
        let retry = self.deps.retry;
        let now = self.deps.clock.now();

        let loaded = retry
            .run("load_player_by_wallet", || {
                persistence.load_player_by_wallet(&identity.wallet)
            })
            .await?;

        let (player, pets) = match loaded {
            Some(player) => {
                let owner = player.id;
                let pets = retry
                    .run("load_pets_for_owner", || persistence.load_pets_for_owner(owner))
                    .await?;
                debug!(
                    session_id = %self.session_id,
                    player_id = %owner,
                    pets = pets.len(),
                    "player loaded from persistence"
                );
                (player, pets)
            }
            None => {
                let player =
                    Player::new(identity, self.deps.rules.catalog.starting_tokens, now);
                if let Err(e) = retry
                    .run("save_player", || persistence.save_player(&player))
                    .await
                {
                    self.dirty.insert(player.id);
                    warn!(
                        session_id = %self.session_id,
                        player_id = %player.id,
                        error = %e,
                        "failed to persist new player, keeping it in memory"
                    );
                }
                info!(
                    session_id = %self.session_id,
                    player_id = %player.id,
                    wallet = %identity.wallet,
                    "new player created"
                );
                (player, Vec::new())
            }
        };

        let player_id = player.id;
        let Ok(()) = self
            .ctx
            .store
            .mutate(|state| -> Result<(), Infallible> {
                state.players.insert(player_id, player);
                for pet in pets {
                    state.pets.insert(pet.id, pet);
                }
                Ok(())
            });
        Ok(player_id)
    }

    async fn leave(&mut self, client_id: ClientId) -> Result<(), RoomError> {
        let slot = self
            .clients
            .remove(&client_id)
            .ok_or(RoomError::UnknownClient(client_id))?;
        info!(
            session_id = %self.session_id,
            client_id = %client_id,
            clients = self.clients.len(),
            "client left"
        );

        let still_connected = self.clients.values().any(|c| c.player_id == slot.player_id);
        if !still_connected {
            self.flush_player(slot.player_id).await;
        }

        if self.clients.is_empty() {
            self.deadline = Instant::now().checked_add(self.deps.grace_period);
            self.set_status(RoomStatus::Draining);
        }
        Ok(())
    }

    /// Best-effort write of a dirty player, their pets, and any deletions
    /// that failed earlier. Clean players are left alone.
    async fn flush_player(&mut self, player_id: PlayerId) {
        if !self.dirty.contains(&player_id) {
            return;
        }

        let state = self.ctx.store.snapshot();
        let mut intents = vec![PersistIntent::Player(player_id)];
        intents.extend(state.pets_of(player_id).map(|p| PersistIntent::Pet(p.id)));
        intents.extend(
            self.pending_deletes
                .iter()
                .filter(|(owner, _)| *owner == player_id)
                .map(|&(owner, pet_id)| PersistIntent::DeletePet { pet_id, owner }),
        );

        match self.persist(&intents).await {
            Ok(()) => {
                self.dirty.remove(&player_id);
                self.pending_deletes.retain(|(owner, _)| *owner != player_id);
                debug!(
                    session_id = %self.session_id,
                    player_id = %player_id,
                    writes = intents.len(),
                    "dirty player flushed"
                );
            }
            Err(e) => warn!(
                session_id = %self.session_id,
                player_id = %player_id,
                error = %e,
                "failed to flush player"
            ),
        }
    }

    /// Remember which players a failed write left ahead of persistence.
    fn mark_dirty(&mut self, intents: &[PersistIntent]) {
        for intent in intents {
            let owner = match *intent {
                PersistIntent::Player(id) => Some(id),
                PersistIntent::Pet(id) => self.ctx.store.state().pets.get(&id).map(|p| p.owner_id),
                PersistIntent::DeletePet { pet_id, owner } => {
                    self.pending_deletes.insert((owner, pet_id));
                    Some(owner)
                }
            };
            if let Some(owner) = owner {
                self.dirty.insert(owner);
            }
        }
    }

    async fn close(&mut self) {
        self.set_status(RoomStatus::Draining);
        let players: Vec<PlayerId> = self.dirty.iter().copied().collect();
        for player_id in &players {
            self.flush_player(*player_id).await;
        }
        self.clients.clear();
        self.set_status(RoomStatus::Closed);
        info!(
            session_id = %self.session_id,
            flushed = players.len(),
            version = self.ctx.store.version(),
            "session closed"
        );
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    async fn dispatch(
        &mut self,
        client_id: ClientId,
        message: &InboundMessage,
    ) -> Result<DispatchOutcome, RoomError> {
        let player_id = self
            .clients
            .get(&client_id)
            .map(|c| c.player_id)
            .ok_or(RoomError::UnknownClient(client_id))?;
        let origin = EventOrigin {
            session_id: self.session_id,
            client_id,
            player_id,
        };
        let now = self.deps.clock.now();
        self.ctx.now = now;

        let outcome = self
            .deps
            .router
            .dispatch(message, origin, now, &self.deps.bus, &mut self.ctx);

        for reply in self.ctx.take_replies() {
            self.deliver(reply, now).await;
        }
        Ok(outcome)
    }

    /// Persist what the reply needs, publish its response event, and send
    /// the envelope to the requesting client.
    async fn deliver(&mut self, reply: Reply, now: DateTime<Utc>) {
        let envelope = match reply.result {
            Ok(outcome) => match self.persist(&outcome.persist).await {
                Ok(()) => {
                    let envelope = ResponseEnvelope::ok(outcome.data, now);
                    match outcome.message {
                        Some(message) => envelope.with_message(message),
                        None => envelope,
                    }
                }
                Err(e) => {
                    self.mark_dirty(&outcome.persist);
                    let error = GameError::PersistenceFailed(e.to_string());
                    ResponseEnvelope::failure(error.code(), error.to_string(), now)
                }
            },
            Err(e) => {
                debug!(
                    session_id = %self.session_id,
                    message_type = %reply.message_type,
                    code = e.code(),
                    error = %e,
                    "request rejected by game rules"
                );
                ResponseEnvelope::failure(e.code(), e.to_string(), now)
            }
        };

        let event = DomainEvent::response(reply.message_type, envelope.clone(), reply.origin, now);
        self.deps
            .bus
            .publish(&event, &mut self.ctx, PublishOptions::default());

        let message = OutboundMessage {
            message_type: reply.message_type.response_type(),
            payload: envelope,
        };
        self.send_to(reply.origin.client_id, message);
    }

    fn send_to(&self, client_id: ClientId, message: OutboundMessage) {
        let Some(slot) = self.clients.get(&client_id) else {
            debug!(client_id = %client_id, "client gone before its response was ready");
            return;
        };
        match slot.outbound.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => warn!(
                session_id = %self.session_id,
                client_id = %client_id,
                message_type = %message.message_type,
                "outbound buffer full, dropping response"
            ),
            Err(TrySendError::Closed(_)) => {
                debug!(client_id = %client_id, "outbound channel closed");
            }
        }
    }

    /// Run the writes a committed mutation asked for, each under the retry
    /// policy. Stops at the first write that still fails.
    async fn persist(&self, intents: &[PersistIntent]) -> Result<(), PersistenceError> {
        let persistence = &self.deps.persistence;
        let retry = self.deps.retry;

        for intent in intents {
            match *intent {
                PersistIntent::Player(id) => {
                    let Some(player) = self.ctx.store.state().players.get(&id).cloned() else {
                        continue;
                    };
                    retry
                        .run("save_player", || persistence.save_player(&player))
                        .await?;
                }
                PersistIntent::Pet(id) => {
                    let Some(pet) = self.ctx.store.state().pets.get(&id).cloned() else {
                        continue;
                    };
                    retry.run("save_pet", || persistence.save_pet(&pet)).await?;
                }
                PersistIntent::DeletePet { pet_id, owner } => {
                    retry
                        .run("delete_pet", || persistence.delete_pet(pet_id, owner))
                        .await?;
                }
            }
        }
        Ok(())
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
