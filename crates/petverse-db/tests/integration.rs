//! Integration tests for the `Dragonfly` persistence adapter.
//!
//! These tests require a live `Dragonfly` (or Redis) instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p petverse-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::Utc;
use petverse_core::PersistencePort;
use petverse_db::DragonflyPersistence;
use petverse_pets::pet::create_pet;
use petverse_types::{PetTypeDef, Player, PlayerIdentity};

/// Dragonfly connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn connect() -> DragonflyPersistence {
    let store = DragonflyPersistence::connect(DRAGONFLY_URL)
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?");
    store.pool().flush_all().await.expect("flush");
    store
}

fn player(wallet: &str) -> Player {
    let identity = PlayerIdentity {
        wallet: String::from(wallet),
        display_name: String::from("Ada"),
    };
    Player::new(&identity, 500, Utc::now())
}

fn cat() -> PetTypeDef {
    PetTypeDef {
        id: String::from("cat"),
        name: String::from("Cat"),
        price: 100,
        growth_duration_secs: 86_400,
        income_cycle_secs: 3_600,
        income_per_cycle: 10,
    }
}

#[tokio::test]
#[ignore = "requires a live Dragonfly instance"]
async fn player_round_trips_by_id_and_wallet() {
    let store = connect().await;
    let p = player("0xdragon");
    store.save_player(&p).await.unwrap();

    assert_eq!(store.load_player(p.id).await.unwrap(), Some(p.clone()));
    assert_eq!(
        store.load_player_by_wallet("0xdragon").await.unwrap(),
        Some(p)
    );
    assert_eq!(store.load_player_by_wallet("0xnobody").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a live Dragonfly instance"]
async fn pets_are_indexed_per_owner() {
    let store = connect().await;
    let owner = player("0xowner");
    let other = player("0xother");
    let a = create_pet(owner.id, &cat(), Some(String::from("Mochi")), Utc::now());
    let b = create_pet(other.id, &cat(), None, Utc::now());
    store.save_pet(&a).await.unwrap();
    store.save_pet(&b).await.unwrap();

    let pets = store.load_pets_for_owner(owner.id).await.unwrap();
    assert_eq!(pets.len(), 1);
    assert_eq!(pets[0].name, "Mochi");

    store.delete_pet(a.id, owner.id).await.unwrap();
    assert!(store.load_pets_for_owner(owner.id).await.unwrap().is_empty());
}
