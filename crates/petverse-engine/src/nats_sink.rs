//! NATS implementation of the remote event sink.
//!
//! Every domain event is published as JSON on a subject equal to its event
//! name, e.g. `game.pet.feed.requested`. Downstream consumers subscribe
//! with wildcards such as `game.pet.>`.

use async_trait::async_trait;
use petverse_events::{RemoteSink, SinkError};
use petverse_types::DomainEvent;
use tracing::debug;

/// Forwards domain events to a NATS server.
pub struct NatsSink {
    client: async_nats::Client,
}

impl NatsSink {
    /// Wrap a connected client.
    pub const fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Connect to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unavailable`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, SinkError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| SinkError::Unavailable(format!("connect to {url}: {e}")))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl RemoteSink for NatsSink {
    async fn publish(&self, event: &DomainEvent) -> Result<(), SinkError> {
        let subject = event.name.to_string();
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| SinkError::Publish(e.to_string()))?;
        debug!(subject = %subject, event_id = %event.id, "event forwarded to NATS");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "nats"
    }
}
