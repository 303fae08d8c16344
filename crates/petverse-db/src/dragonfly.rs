//! `Dragonfly` (Redis-compatible) connection and typed key operations.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `player:{id}` | JSON | Full player document |
//! | `wallet:{address}` | String | Player id owning the wallet |
//! | `pet:{id}` | JSON | Full pet document |
//! | `player:{id}:pets` | Set | Ids of the player's pets |

use fred::prelude::*;
use petverse_types::{PetId, PlayerId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;

/// Key of a player document.
pub fn player_key(id: PlayerId) -> String {
    format!("player:{id}")
}

/// Key of the wallet index entry.
pub fn wallet_key(wallet: &str) -> String {
    format!("wallet:{wallet}")
}

/// Key of a pet document.
pub fn pet_key(id: PetId) -> String {
    format!("pet:{id}")
}

/// Key of the set of pets owned by a player.
pub fn owned_pets_key(owner: PlayerId) -> String {
    format!("player:{owner}:pets")
}

/// Connection handle to a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Serialize `value` as JSON and store it at `key`.
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let _: () = self.client.set(key, json.as_str(), None, None, false).await?;
        Ok(())
    }

    /// Read the JSON value at `key`, or `None` if the key does not exist.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value
            .map(|s| serde_json::from_str(&s).map_err(DbError::from))
            .transpose()
    }

    /// Store a plain string at `key`.
    pub async fn set_str(&self, key: &str, value: &str) -> Result<(), DbError> {
        let _: () = self.client.set(key, value, None, None, false).await?;
        Ok(())
    }

    /// Read a plain string from `key`.
    pub async fn get_str(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self.client.get(key).await?)
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Add `member` to the set at `key`.
    pub async fn add_member(&self, key: &str, member: &str) -> Result<(), DbError> {
        let _: u32 = self.client.sadd(key, member).await?;
        Ok(())
    }

    /// Remove `member` from the set at `key`.
    pub async fn remove_member(&self, key: &str, member: &str) -> Result<(), DbError> {
        let _: u32 = self.client.srem(key, member).await?;
        Ok(())
    }

    /// All members of the set at `key`.
    pub async fn members(&self, key: &str) -> Result<Vec<String>, DbError> {
        Ok(self.client.smembers(key).await?)
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }
}
