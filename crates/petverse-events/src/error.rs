//! Error types for the event bus.
//!
//! Handler failures are logged by the bus and never returned to the
//! publisher. Sink failures are retried, then logged and dropped.

/// A local subscriber failed to process an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The event carried a payload the subscriber does not understand.
    #[error("unexpected payload for {event}")]
    UnexpectedPayload {
        /// Name of the event.
        event: String,
    },

    /// The subscriber could not complete its work.
    #[error("handler failed: {0}")]
    Failed(String),
}

/// The remote broker rejected or could not accept an event.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The broker connection is not available.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// The event could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker returned an error on publish.
    #[error("publish failed: {0}")]
    Publish(String),
}
