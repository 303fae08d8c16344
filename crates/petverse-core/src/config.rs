//! Configuration loading and typed config structures for Petverse.
//!
//! The canonical configuration lives in `petverse-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure. Every section and field has a default, so a partial file
//! (or none at all) still yields a runnable configuration.

use std::path::Path;
use std::time::Duration;

use petverse_events::RetryExecutor;
use petverse_pets::LifecycleConfig;
use petverse_types::{ItemDef, ItemEffect, ItemType, PetTypeDef};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level application configuration.
///
/// Mirrors the structure of `petverse-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Catalog and economy balance values.
    #[serde(default)]
    pub game: GameConfig,

    /// Pet decay rates and care constants.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Session room policy.
    #[serde(default)]
    pub session: SessionConfig,

    /// Infrastructure connection settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for infrastructure:
    /// - `NATS_URL` overrides `infrastructure.nats_url`
    /// - `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`
    /// - `PETVERSE_PORT` overrides `infrastructure.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Assemble the balance values handed to session rooms.
    pub fn rules(&self) -> GameRules {
        GameRules {
            catalog: self.game.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Catalog and economy values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Tokens granted to a brand-new player.
    #[serde(default = "default_starting_tokens")]
    pub starting_tokens: u64,

    /// Purchasable pet types.
    #[serde(default = "default_pet_types")]
    pub pet_types: Vec<PetTypeDef>,

    /// Purchasable store items.
    #[serde(default = "default_items")]
    pub items: Vec<ItemDef>,
}

impl GameConfig {
    /// Look up a pet type by catalog id.
    pub fn pet_type(&self, id: &str) -> Option<&PetTypeDef> {
        self.pet_types.iter().find(|p| p.id == id)
    }

    /// Look up a store item by catalog id.
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_tokens: default_starting_tokens(),
            pet_types: default_pet_types(),
            items: default_items(),
        }
    }
}

/// Balance values shared by every room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRules {
    /// Catalog and economy.
    pub catalog: GameConfig,
    /// Decay and care.
    pub lifecycle: LifecycleConfig,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Session room policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Seconds an empty room waits for a rejoin before closing.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,

    /// Per-client outbound message buffer.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Room command queue depth.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl SessionConfig {
    /// Grace period as a [`Duration`].
    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period_secs(),
            outbound_buffer: default_outbound_buffer(),
            command_buffer: default_command_buffer(),
        }
    }
}

// ---------------------------------------------------------------------------
// Infrastructure
// ---------------------------------------------------------------------------

/// Which persistence backend rooms write through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    /// In-process maps. Data is lost on restart.
    #[default]
    Memory,
    /// Dragonfly (Redis-compatible).
    Dragonfly,
}

/// Infrastructure connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// HTTP/WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Persistence backend.
    #[serde(default)]
    pub persistence: PersistenceBackend,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Forward domain events to NATS.
    #[serde(default)]
    pub nats_enabled: bool,

    /// NATS messaging URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Retries after the first failed call to an external collaborator.
    #[serde(default = "default_retry_max")]
    pub retry_max: u32,

    /// Fixed wait between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl InfrastructureConfig {
    /// Override infrastructure settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NATS_URL") {
            self.nats_url = val;
            self.nats_enabled = true;
        }
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = val;
            self.persistence = PersistenceBackend::Dragonfly;
        }
        if let Ok(val) = std::env::var("PETVERSE_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(e) => tracing::warn!(value = val, error = %e, "ignoring invalid PETVERSE_PORT"),
            }
        }
    }

    /// Retry policy for external calls.
    pub const fn retry(&self) -> RetryExecutor {
        RetryExecutor::new(self.retry_max, Duration::from_millis(self.retry_delay_ms))
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            persistence: PersistenceBackend::default(),
            dragonfly_url: default_dragonfly_url(),
            nats_enabled: false,
            nats_url: default_nats_url(),
            retry_max: default_retry_max(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_starting_tokens() -> u64 {
    500
}

fn default_pet_types() -> Vec<PetTypeDef> {
    vec![
        PetTypeDef {
            id: String::from("cat"),
            name: String::from("Cat"),
            price: 100,
            growth_duration_secs: 86_400,
            income_cycle_secs: 3_600,
            income_per_cycle: 10,
        },
        PetTypeDef {
            id: String::from("dog"),
            name: String::from("Dog"),
            price: 150,
            growth_duration_secs: 172_800,
            income_cycle_secs: 3_600,
            income_per_cycle: 15,
        },
    ]
}

fn default_items() -> Vec<ItemDef> {
    vec![
        ItemDef {
            id: String::from("apple"),
            name: String::from("Apple"),
            item_type: ItemType::Food,
            price: 5,
            effect: ItemEffect {
                hunger: 20.0,
                happiness: 2.0,
                cleanliness: 0.0,
            },
        },
        ItemDef {
            id: String::from("steak"),
            name: String::from("Steak"),
            item_type: ItemType::Food,
            price: 20,
            effect: ItemEffect {
                hunger: 60.0,
                happiness: 10.0,
                cleanliness: 0.0,
            },
        },
        ItemDef {
            id: String::from("ball"),
            name: String::from("Ball"),
            item_type: ItemType::Toy,
            price: 30,
            effect: ItemEffect {
                hunger: 0.0,
                happiness: 25.0,
                cleanliness: 0.0,
            },
        },
        ItemDef {
            id: String::from("soap"),
            name: String::from("Soap"),
            item_type: ItemType::Cleaning,
            price: 10,
            effect: ItemEffect {
                hunger: 0.0,
                happiness: 0.0,
                cleanliness: 40.0,
            },
        },
        ItemDef {
            id: String::from("bowtie"),
            name: String::from("Bow Tie"),
            item_type: ItemType::Accessory,
            price: 50,
            effect: ItemEffect::default(),
        },
    ]
}

const fn default_grace_period_secs() -> u64 {
    30
}

const fn default_outbound_buffer() -> usize {
    64
}

const fn default_command_buffer() -> usize {
    256
}

const fn default_port() -> u16 {
    8080
}

fn default_dragonfly_url() -> String {
    String::from("redis://localhost:6379")
}

fn default_nats_url() -> String {
    String::from("nats://localhost:4222")
}

const fn default_retry_max() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    String::from("info")
}
