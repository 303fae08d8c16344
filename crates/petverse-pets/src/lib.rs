//! Pet lifecycle, wallet, and inventory rules for Petverse.
//!
//! Everything in this crate is synchronous and free of I/O. Stat decay and
//! income accrual are computed from elapsed wall-clock time at read time;
//! nothing runs in the background.
//!
//! # Modules
//!
//! - [`config`] -- Decay rates and care constants
//! - [`error`] -- Business-rule error taxonomy with wire codes
//! - [`lifecycle`] -- Stat projection, commit, income, cleaning
//! - [`pet`] -- Pet creation and ownership checks
//! - [`wallet`] -- Checked token balance operations
//! - [`inventory`] -- Checked inventory operations

pub mod config;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod pet;
pub mod wallet;

pub use config::LifecycleConfig;
pub use error::GameError;
pub use lifecycle::{CommitOutcome, ProjectedStats, commit, project_stats};
