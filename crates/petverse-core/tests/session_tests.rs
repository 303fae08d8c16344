//! Integration tests for session rooms.
//!
//! Each test spawns a real room task and drives it through its
//! [`RoomHandle`], the same way the WebSocket transport does. Game time
//! comes from a [`ManualClock`]; the grace timer runs on Tokio's paused
//! clock where a test needs it to expire.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use petverse_core::{
    AppConfig, DispatchOutcome, JoinTicket, ManualClock, MemoryPersistence, PersistenceError,
    PersistencePort, RoomDeps, RoomError, RoomHandle, RoomStatus, SessionRegistry, SessionRoom,
    room_deps,
};
use petverse_events::{RemoteSink, RetryExecutor, SinkError};
use petverse_types::{
    DomainEvent, InboundMessage, ItemDef, ItemEffect, ItemType, OutboundMessage, Pet, PetId,
    Player, PlayerId, PlayerIdentity, SessionId, StateUpdate,
};
use serde_json::{Value, json};
use tokio::sync::mpsc::error::TryRecvError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Rig {
    handle: RoomHandle,
    clock: Arc<ManualClock>,
    persistence: Arc<MemoryPersistence>,
}

fn deps_with(
    config: &AppConfig,
    persistence: Arc<dyn PersistencePort>,
    clock: Arc<ManualClock>,
    remote: Option<Arc<dyn RemoteSink>>,
) -> RoomDeps {
    let mut deps = room_deps(config, persistence, clock, remote);
    deps.retry = RetryExecutor::none();
    deps.grace_period = Duration::from_secs(30);
    deps
}

fn spawn_room(config: &AppConfig) -> Rig {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let persistence = Arc::new(MemoryPersistence::new());
    let deps = deps_with(config, persistence.clone(), clock.clone(), None);
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);
    Rig {
        handle,
        clock,
        persistence,
    }
}

fn rig_on(persistence: &Arc<MemoryPersistence>, clock: &Arc<ManualClock>) -> Rig {
    let deps = deps_with(
        &AppConfig::default(),
        persistence.clone(),
        clock.clone(),
        None,
    );
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);
    Rig {
        handle,
        clock: Arc::clone(clock),
        persistence: Arc::clone(persistence),
    }
}

async fn settle(registry: &SessionRegistry) {
    for _ in 0..50 {
        if registry.is_empty().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn identity(wallet: &str) -> PlayerIdentity {
    PlayerIdentity {
        wallet: String::from(wallet),
        display_name: format!("player-{wallet}"),
    }
}

fn msg(kind: &str, payload: Value) -> InboundMessage {
    InboundMessage {
        message_type: String::from(kind),
        payload,
    }
}

async fn send(rig: &Rig, ticket: &mut JoinTicket, kind: &str, payload: Value) -> OutboundMessage {
    let outcome = rig
        .handle
        .send(ticket.client_id, msg(kind, payload))
        .await
        .unwrap();
    assert!(
        matches!(outcome, DispatchOutcome::Published { .. }),
        "{kind} was not published: {outcome:?}"
    );
    ticket.outbound.try_recv().expect("response queued")
}

fn data(response: &OutboundMessage) -> &Value {
    response.payload.data.as_ref().expect("response carries data")
}

async fn buy_cat(rig: &Rig, ticket: &mut JoinTicket) -> PetId {
    let response = send(rig, ticket, "buy_pet", json!({"petType": "cat"})).await;
    assert!(response.payload.success, "{response:?}");
    data(&response)["pet"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_creates_player_with_starting_balance() {
    let rig = spawn_room(&AppConfig::default());
    let ticket = rig.handle.join(identity("0xa")).await.unwrap();

    let StateUpdate::State { state, .. } = &ticket.snapshot else {
        panic!("join snapshot must be a full state");
    };
    let player = &state["players"][ticket.player_id.to_string()];
    assert_eq!(player["tokens"], json!(500));
    assert_eq!(player["wallet"], json!("0xa"));
    assert_eq!(rig.handle.status(), RoomStatus::Active);
    assert_eq!(rig.persistence.player_count().await, 1);
}

#[tokio::test]
async fn rejoining_with_same_wallet_reuses_player() {
    let rig = spawn_room(&AppConfig::default());
    let first = rig.handle.join(identity("0xa")).await.unwrap();
    let second = rig.handle.join(identity("0xa")).await.unwrap();

    assert_eq!(first.player_id, second.player_id);
    assert_ne!(first.client_id, second.client_id);
    assert_eq!(rig.handle.info().await.unwrap().clients, 2);
}

#[tokio::test]
async fn join_loads_known_player_from_persistence() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let persistence = Arc::new(MemoryPersistence::new());
    let stored = Player::new(&identity("0xold"), 77, Utc::now());
    persistence.save_player(&stored).await.unwrap();

    let deps = deps_with(&AppConfig::default(), persistence, clock, None);
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);
    let ticket = handle.join(identity("0xold")).await.unwrap();

    assert_eq!(ticket.player_id, stored.id);
    let StateUpdate::State { state, .. } = &ticket.snapshot else {
        panic!("join snapshot must be a full state");
    };
    assert_eq!(state["players"][stored.id.to_string()]["tokens"], json!(77));
}

// ---------------------------------------------------------------------------
// Gameplay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn buy_food_updates_inventory_and_broadcasts_patch() {
    let rig = spawn_room(&AppConfig::default());
    let mut ticket = rig.handle.join(identity("0xa")).await.unwrap();
    let joined_at = ticket.snapshot.version();

    let response = send(
        &rig,
        &mut ticket,
        "buy_food",
        json!({"itemId": "apple", "itemType": "food", "quantity": 2}),
    )
    .await;

    assert_eq!(response.message_type, "buy_food_response");
    assert!(response.payload.success);
    assert_eq!(data(&response)["tokens"], json!(490));
    assert_eq!(data(&response)["item"]["quantity"], json!(2));

    match ticket.updates.try_recv().unwrap() {
        StateUpdate::StatePatch { version, ops } => {
            assert_eq!(version, joined_at + 1);
            assert!(ops.iter().any(|op| op.path.ends_with("/tokens")));
        }
        other @ StateUpdate::State { .. } => panic!("expected a patch, got {other:?}"),
    }
}

#[tokio::test]
async fn purchase_beyond_balance_is_rejected_without_change() {
    let mut config = AppConfig::default();
    config.game.starting_tokens = 40;
    config.game.items.push(ItemDef {
        id: String::from("lamp"),
        name: String::from("Lamp"),
        item_type: ItemType::Accessory,
        price: 50,
        effect: ItemEffect::default(),
    });
    let rig = spawn_room(&config);
    let mut ticket = rig.handle.join(identity("0xa")).await.unwrap();
    let version = rig.handle.info().await.unwrap().version;

    let response = send(
        &rig,
        &mut ticket,
        "purchase_item",
        json!({"itemId": "lamp", "itemType": "accessory", "quantity": 1}),
    )
    .await;

    assert!(!response.payload.success);
    assert_eq!(response.payload.error.as_deref(), Some("INSUFFICIENT_TOKENS"));
    assert_eq!(rig.handle.info().await.unwrap().version, version);
    assert!(ticket.updates.try_recv().is_err());

    let profile = send(&rig, &mut ticket, "get_profile", json!({})).await;
    assert_eq!(data(&profile)["tokens"], json!(40));
}

#[tokio::test]
async fn buy_food_without_quantity_is_dropped() {
    let rig = spawn_room(&AppConfig::default());
    let ticket = rig.handle.join(identity("0xa")).await.unwrap();
    let version = rig.handle.info().await.unwrap().version;

    let outcome = rig
        .handle
        .send(ticket.client_id, msg("buy_food", json!({"itemId": "apple", "itemType": "food"})))
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Rejected { .. }));
    let mut outbound = ticket.outbound;
    assert!(matches!(outbound.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(rig.handle.info().await.unwrap().version, version);
}

#[tokio::test]
async fn unknown_message_type_is_dropped() {
    let rig = spawn_room(&AppConfig::default());
    let mut ticket = rig.handle.join(identity("0xa")).await.unwrap();

    let outcome = rig
        .handle
        .send(ticket.client_id, msg("summon_dragon", json!({})))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::UnknownType(String::from("summon_dragon"))
    );
    assert!(matches!(ticket.outbound.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn feeding_restores_an_exhausted_pet() {
    let rig = spawn_room(&AppConfig::default());
    let mut ticket = rig.handle.join(identity("0xa")).await.unwrap();
    let pet_id = buy_cat(&rig, &mut ticket).await;
    send(
        &rig,
        &mut ticket,
        "buy_food",
        json!({"itemId": "apple", "itemType": "food", "quantity": 1}),
    )
    .await;

    // Long enough for every default decay rate to bottom out.
    rig.clock.advance(chrono::Duration::hours(10));
    let state = send(&rig, &mut ticket, "request_pets_state", json!({})).await;
    assert_eq!(data(&state)["pets"][0]["stats"]["status"], json!("exhausted"));

    let fed = send(
        &rig,
        &mut ticket,
        "feed_pet",
        json!({"petId": pet_id.to_string(), "itemId": "apple", "itemType": "food"}),
    )
    .await;
    assert!(fed.payload.success, "{fed:?}");
    assert_eq!(data(&fed)["stats"]["status"], json!("active"));
    assert_eq!(data(&fed)["stats"]["hunger"], json!(20.0));
}

#[tokio::test]
async fn another_players_pet_cannot_be_fed() {
    let rig = spawn_room(&AppConfig::default());
    let mut owner = rig.handle.join(identity("0xowner")).await.unwrap();
    let mut other = rig.handle.join(identity("0xother")).await.unwrap();
    let pet_id = buy_cat(&rig, &mut owner).await;
    send(
        &rig,
        &mut other,
        "buy_food",
        json!({"itemId": "apple", "itemType": "food", "quantity": 1}),
    )
    .await;

    let response = send(
        &rig,
        &mut other,
        "feed_pet",
        json!({"petId": pet_id.to_string(), "itemId": "apple", "itemType": "food"}),
    )
    .await;

    assert_eq!(response.payload.error.as_deref(), Some("NOT_PET_OWNER"));
    let inventory = send(&rig, &mut other, "get_inventory", json!({})).await;
    assert_eq!(data(&inventory)["items"][0]["quantity"], json!(1));
}

#[tokio::test]
async fn daily_reward_is_capped_at_one_cycle() {
    let rig = spawn_room(&AppConfig::default());
    let mut ticket = rig.handle.join(identity("0xa")).await.unwrap();
    buy_cat(&rig, &mut ticket).await;

    let early = send(&rig, &mut ticket, "claim_daily_reward", json!({})).await;
    assert_eq!(early.payload.error.as_deref(), Some("NO_REWARD_AVAILABLE"));

    rig.clock.advance(chrono::Duration::hours(5));
    let claimed = send(&rig, &mut ticket, "claim_daily_reward", json!({})).await;
    assert!(claimed.payload.success);
    assert_eq!(data(&claimed)["claimed"], json!(10));
    assert_eq!(data(&claimed)["tokens"], json!(410));

    let again = send(&rig, &mut ticket, "claim_daily_reward", json!({})).await;
    assert_eq!(again.payload.error.as_deref(), Some("NO_REWARD_AVAILABLE"));
}

#[tokio::test]
async fn responses_go_only_to_the_requesting_client() {
    let rig = spawn_room(&AppConfig::default());
    let mut a = rig.handle.join(identity("0xa")).await.unwrap();
    let mut b = rig.handle.join(identity("0xb")).await.unwrap();

    send(&rig, &mut a, "get_profile", json!({})).await;

    assert!(matches!(b.outbound.try_recv(), Err(TryRecvError::Empty)));
    // Both still see committed state changes.
    send(
        &rig,
        &mut a,
        "buy_food",
        json!({"itemId": "apple", "itemType": "food", "quantity": 1}),
    )
    .await;
    assert!(b.updates.try_recv().is_ok());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

struct BrokenWrites;

#[async_trait]
impl PersistencePort for BrokenWrites {
    async fn load_player(&self, _id: PlayerId) -> Result<Option<Player>, PersistenceError> {
        Ok(None)
    }

    async fn load_player_by_wallet(
        &self,
        _wallet: &str,
    ) -> Result<Option<Player>, PersistenceError> {
        Ok(None)
    }

    async fn save_player(&self, _player: &Player) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable(String::from("connection refused")))
    }

    async fn load_pets_for_owner(&self, _owner: PlayerId) -> Result<Vec<Pet>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn save_pet(&self, _pet: &Pet) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable(String::from("connection refused")))
    }

    async fn delete_pet(&self, _id: PetId, _owner: PlayerId) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable(String::from("connection refused")))
    }
}

struct BrokenReads;

#[async_trait]
impl PersistencePort for BrokenReads {
    async fn load_player(&self, _id: PlayerId) -> Result<Option<Player>, PersistenceError> {
        Err(PersistenceError::Backend(String::from("timeout")))
    }

    async fn load_player_by_wallet(
        &self,
        _wallet: &str,
    ) -> Result<Option<Player>, PersistenceError> {
        Err(PersistenceError::Backend(String::from("timeout")))
    }

    async fn save_player(&self, _player: &Player) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn load_pets_for_owner(&self, _owner: PlayerId) -> Result<Vec<Pet>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn save_pet(&self, _pet: &Pet) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn delete_pet(&self, _id: PetId, _owner: PlayerId) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[tokio::test]
async fn failed_write_turns_response_into_persistence_failure() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let deps = deps_with(&AppConfig::default(), Arc::new(BrokenWrites), clock, None);
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);
    let mut ticket = handle.join(identity("0xa")).await.unwrap();

    handle
        .send(
            ticket.client_id,
            msg("buy_food", json!({"itemId": "apple", "itemType": "food", "quantity": 1})),
        )
        .await
        .unwrap();
    let response = ticket.outbound.try_recv().unwrap();

    assert!(!response.payload.success);
    assert_eq!(response.payload.error.as_deref(), Some("PERSISTENCE_FAILED"));
}

/// In-memory storage whose writes can be switched off.
struct FlakyWrites {
    inner: MemoryPersistence,
    failing: AtomicBool,
}

impl FlakyWrites {
    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable(String::from("connection reset")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistencePort for FlakyWrites {
    async fn load_player(&self, id: PlayerId) -> Result<Option<Player>, PersistenceError> {
        self.inner.load_player(id).await
    }

    async fn load_player_by_wallet(
        &self,
        wallet: &str,
    ) -> Result<Option<Player>, PersistenceError> {
        self.inner.load_player_by_wallet(wallet).await
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistenceError> {
        self.check()?;
        self.inner.save_player(player).await
    }

    async fn load_pets_for_owner(&self, owner: PlayerId) -> Result<Vec<Pet>, PersistenceError> {
        self.inner.load_pets_for_owner(owner).await
    }

    async fn save_pet(&self, pet: &Pet) -> Result<(), PersistenceError> {
        self.check()?;
        self.inner.save_pet(pet).await
    }

    async fn delete_pet(&self, id: PetId, owner: PlayerId) -> Result<(), PersistenceError> {
        self.check()?;
        self.inner.delete_pet(id, owner).await
    }
}

#[tokio::test]
async fn failed_write_is_flushed_when_the_player_leaves() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let storage = Arc::new(FlakyWrites {
        inner: MemoryPersistence::new(),
        failing: AtomicBool::new(true),
    });
    let deps = deps_with(&AppConfig::default(), storage.clone(), clock, None);
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);
    let mut ticket = handle.join(identity("0xa")).await.unwrap();

    handle
        .send(ticket.client_id, msg("buy_pet", json!({"petType": "cat"})))
        .await
        .unwrap();
    let response = ticket.outbound.try_recv().unwrap();
    assert_eq!(response.payload.error.as_deref(), Some("PERSISTENCE_FAILED"));
    assert_eq!(storage.inner.player_count().await, 0);

    storage.failing.store(false, Ordering::SeqCst);
    handle.leave(ticket.client_id).await.unwrap();

    let stored = storage
        .inner
        .load_player(ticket.player_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.tokens, 400);
    assert_eq!(storage.inner.pet_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn closing_room_does_not_overwrite_newer_saves() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let persistence = Arc::new(MemoryPersistence::new());
    let first = rig_on(&persistence, &clock);
    let second = rig_on(&persistence, &clock);

    let mut in_first = first.handle.join(identity("0xa")).await.unwrap();
    buy_cat(&first, &mut in_first).await;
    first.handle.leave(in_first.client_id).await.unwrap();

    let mut in_second = second.handle.join(identity("0xa")).await.unwrap();
    assert_eq!(in_second.player_id, in_first.player_id);
    buy_cat(&second, &mut in_second).await;

    tokio::time::sleep(Duration::from_secs(31)).await;
    first.handle.wait_for(RoomStatus::Closed).await.unwrap();
    assert_eq!(second.handle.status(), RoomStatus::Active);

    let stored = persistence
        .load_player(in_first.player_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.tokens, 300);
    assert_eq!(stored.owned_pet_count, 2);
    assert_eq!(persistence.pet_count().await, 2);
}

#[tokio::test]
async fn failed_load_rejects_join() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let deps = deps_with(&AppConfig::default(), Arc::new(BrokenReads), clock, None);
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);

    let err = handle.join(identity("0xa")).await.unwrap_err();
    assert!(matches!(err, RoomError::Persistence(_)));
    assert_eq!(handle.status(), RoomStatus::Created);
}

#[tokio::test]
async fn remote_sink_failure_does_not_block_local_delivery() {
    struct DeadBroker;

    #[async_trait]
    impl RemoteSink for DeadBroker {
        async fn publish(&self, _event: &DomainEvent) -> Result<(), SinkError> {
            Err(SinkError::Unavailable(String::from("broker down")))
        }
    }

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let deps = deps_with(
        &AppConfig::default(),
        Arc::new(MemoryPersistence::new()),
        clock,
        Some(Arc::new(DeadBroker)),
    );
    let (handle, _task) = SessionRoom::spawn(SessionId::new(), deps);
    let mut ticket = handle.join(identity("0xa")).await.unwrap();

    handle
        .send(
            ticket.client_id,
            msg("buy_food", json!({"itemId": "apple", "itemType": "food", "quantity": 1})),
        )
        .await
        .unwrap();

    assert!(ticket.outbound.try_recv().unwrap().payload.success);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn room_walks_through_its_lifecycle() {
    let rig = spawn_room(&AppConfig::default());
    assert_eq!(rig.handle.status(), RoomStatus::Created);

    let first = rig.handle.join(identity("0xa")).await.unwrap();
    assert_eq!(rig.handle.status(), RoomStatus::Active);

    rig.handle.leave(first.client_id).await.unwrap();
    assert_eq!(rig.handle.status(), RoomStatus::Draining);

    let second = rig.handle.join(identity("0xa")).await.unwrap();
    assert_eq!(rig.handle.status(), RoomStatus::Active);

    rig.handle.leave(second.client_id).await.unwrap();
    rig.handle.wait_for(RoomStatus::Closed).await.unwrap();

    let err = rig.handle.join(identity("0xa")).await.unwrap_err();
    assert!(matches!(err, RoomError::Closed(_)));
}

#[tokio::test(start_paused = true)]
async fn draining_room_survives_until_grace_expires() {
    let rig = spawn_room(&AppConfig::default());
    let ticket = rig.handle.join(identity("0xa")).await.unwrap();
    rig.handle.leave(ticket.client_id).await.unwrap();

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(rig.handle.status(), RoomStatus::Draining);

    tokio::time::sleep(Duration::from_secs(2)).await;
    rig.handle.wait_for(RoomStatus::Closed).await.unwrap();
}

#[tokio::test]
async fn leaving_twice_is_an_unknown_client() {
    let rig = spawn_room(&AppConfig::default());
    let ticket = rig.handle.join(identity("0xa")).await.unwrap();
    rig.handle.leave(ticket.client_id).await.unwrap();

    let err = rig.handle.leave(ticket.client_id).await.unwrap_err();
    assert_eq!(err, RoomError::UnknownClient(ticket.client_id));
}

#[tokio::test]
async fn shutdown_flushes_players_and_pets() {
    let rig = spawn_room(&AppConfig::default());
    let mut ticket = rig.handle.join(identity("0xa")).await.unwrap();
    buy_cat(&rig, &mut ticket).await;

    rig.handle.shutdown().await.unwrap();

    assert_eq!(rig.handle.status(), RoomStatus::Closed);
    assert_eq!(rig.persistence.player_count().await, 1);
    assert_eq!(rig.persistence.pet_count().await, 1);
    let stored = rig
        .persistence
        .load_player(ticket.player_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.tokens, 400);
    assert_eq!(stored.owned_pet_count, 1);
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registry_reuses_live_rooms_and_forgets_closed_ones() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let deps = deps_with(
        &AppConfig::default(),
        Arc::new(MemoryPersistence::new()),
        clock,
        None,
    );
    let registry = SessionRegistry::new(deps);
    let id = SessionId::new();

    let a = registry.get_or_create(id).await;
    let b = registry.get_or_create(id).await;
    assert_eq!(a.session_id(), b.session_id());
    assert_eq!(registry.list().await.len(), 1);

    a.shutdown().await.unwrap();
    assert!(registry.get(id).await.is_none());
    settle(&registry).await;
    assert!(registry.is_empty().await);

    let fresh = registry.get_or_create(id).await;
    assert_eq!(fresh.status(), RoomStatus::Created);

    registry.shutdown_all().await;
    assert!(registry.list().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn registry_drops_rooms_closed_by_grace_timer() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let deps = deps_with(
        &AppConfig::default(),
        Arc::new(MemoryPersistence::new()),
        clock,
        None,
    );
    let registry = SessionRegistry::new(deps);

    let mut handles = Vec::new();
    for _ in 0..5 {
        handles.push(registry.get_or_create(SessionId::new()).await);
    }
    assert_eq!(registry.len().await, 5);

    tokio::time::sleep(Duration::from_secs(31)).await;
    for handle in &handles {
        handle.wait_for(RoomStatus::Closed).await.unwrap();
    }
    settle(&registry).await;

    assert!(registry.is_empty().await);
    assert_eq!(registry.prune().await, 0);
}
