//! `Dragonfly` persistence for the Petverse session engine.
//!
//! Rooms keep the authoritative state in memory and write players and pets
//! through the [`PersistencePort`](petverse_core::PersistencePort). This
//! crate implements that port on a `Dragonfly` (Redis-compatible) instance.
//!
//! # Modules
//!
//! - [`dragonfly`] -- Connection handle and key patterns
//! - [`store`] -- The persistence port implementation
//! - [`error`] -- Data layer errors and their port mapping

pub mod dragonfly;
pub mod error;
pub mod store;

pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use store::DragonflyPersistence;
