//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`fred`] and [`serde_json`] errors. At the port boundary they are
//! flattened into [`PersistenceError`] so rooms never see backend types.

use petverse_core::PersistenceError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value is not what its key promises.
    #[error("Corrupt value at {key}: {message}")]
    Corrupt {
        /// Offending key.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for PersistenceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Dragonfly(inner) if matches!(inner.kind(), fred::error::ErrorKind::IO) => {
                Self::Unavailable(inner.to_string())
            }
            DbError::Dragonfly(inner) => Self::Backend(inner.to_string()),
            DbError::Serialization(inner) => Self::Serialization(inner.to_string()),
            corrupt @ DbError::Corrupt { .. } => Self::Serialization(corrupt.to_string()),
            DbError::Config(message) => Self::Unavailable(message),
        }
    }
}
