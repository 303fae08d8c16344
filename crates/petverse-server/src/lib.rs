//! Network transport for the Petverse session engine.
//!
//! This crate puts an Axum server in front of the
//! [`SessionRegistry`](petverse_core::SessionRegistry):
//!
//! - **`WebSocket` endpoint** (`/ws/sessions/{id}`) where game clients
//!   join a session, send messages, and receive responses plus state
//!   patches
//! - **REST endpoints** for health and for inspecting or closing sessions
//!
//! # Modules
//!
//! - [`error`] -- [`ApiError`] with its HTTP mapping
//! - [`handlers`] -- REST handlers
//! - [`router`] -- route table
//! - [`server`] -- bind and serve
//! - [`startup`] -- background spawn helper
//! - [`state`] -- shared request state
//! - [`ws`] -- client `WebSocket` loop

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_server};
pub use state::AppState;
