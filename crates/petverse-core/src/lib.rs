//! Session engine for Petverse.
//!
//! Rooms own their session's replicated state and process that session's
//! messages one at a time. Inbound messages are validated by the
//! [`MessageRouter`], published as domain events on the shared bus, handled
//! by the feature modules, persisted, and answered with `*_response`
//! envelopes. Every committed change is broadcast to the session's clients
//! as a state patch.
//!
//! # Modules
//!
//! - [`clock`] -- Wall clock abstraction for deterministic tests
//! - [`config`] -- YAML configuration with environment overrides
//! - [`context`] -- Per-session context and reply outbox for handlers
//! - [`error`] -- Room command errors
//! - [`handlers`] -- Pet, food, inventory, and player features
//! - [`persistence`] -- Storage port and in-memory implementation
//! - [`registry`] -- Session id to live room lookup
//! - [`room`] -- Session room actor and its handle
//! - [`router`] -- Message type to validator table and dispatch
//! - [`serializer`] -- State tree encoding and JSON diff
//! - [`state`] -- The replicated state tree
//! - [`store`] -- Atomic mutation and state broadcast
//! - [`validation`] -- Inbound payload validators
//! - [`wiring`] -- Dependency assembly from configuration

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod persistence;
pub mod registry;
pub mod room;
pub mod router;
pub mod serializer;
pub mod state;
pub mod store;
pub mod validation;
pub mod wiring;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, GameRules};
pub use context::{Outcome, PersistIntent, RoomContext};
pub use error::RoomError;
pub use persistence::{MemoryPersistence, PersistenceError, PersistencePort};
pub use registry::SessionRegistry;
pub use room::{JoinTicket, RoomDeps, RoomHandle, RoomInfo, RoomStatus, SessionRoom};
pub use router::{DispatchOutcome, MessageRouter, RouterBuilder};
pub use state::SessionState;
pub use store::ReplicatedStateStore;
pub use wiring::room_deps;
