//! Tunables for pet decay and care.
//!
//! Values come from the `lifecycle` section of `petverse-config.yaml`.
//! Game balance is data, not code: nothing in this crate hardcodes a rate.

use serde::Deserialize;

/// Decay rates and care constants.
///
/// Rates are stat points lost per real-time minute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Hunger points lost per minute (default: 0.5).
    pub hunger_decay_per_minute: f64,

    /// Happiness points lost per minute (default: 0.3).
    pub happiness_decay_per_minute: f64,

    /// Cleanliness points lost per minute (default: 0.4).
    pub cleanliness_decay_per_minute: f64,

    /// Hunger or cleanliness level at or below which a commit drops waste (default: 50).
    pub waste_threshold: f64,

    /// Waste objects a single pet may accumulate (default: 5).
    pub max_waste_per_pet: usize,

    /// Cleanliness restored by a clean action (default: 30).
    pub clean_restore: f64,

    /// Width and height of the play area waste is scattered over (default: 100).
    /// Values that are not finite or below one fall back to the default.
    pub play_area_size: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            hunger_decay_per_minute: 0.5,
            happiness_decay_per_minute: 0.3,
            cleanliness_decay_per_minute: 0.4,
            waste_threshold: 50.0,
            max_waste_per_pet: 5,
            clean_restore: 30.0,
            play_area_size: 100.0,
        }
    }
}
