//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup so `main` can
//! propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: petverse_core::ConfigError,
    },

    /// Dragonfly connection failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: petverse_db::DbError,
    },

    /// NATS connection failed.
    #[error("NATS error: {message}")]
    Nats {
        /// Description of the NATS failure.
        message: String,
    },

    /// The HTTP server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: petverse_server::StartupError,
    },
}
