//! Remote broker port.
//!
//! The bus forwards every published event to at most one [`RemoteSink`].
//! Delivery is best-effort: the bus retries through its
//! [`RetryExecutor`](crate::retry::RetryExecutor), then logs and drops.

use async_trait::async_trait;
use petverse_types::DomainEvent;

use crate::error::SinkError;

/// An external broker that receives domain events.
///
/// Each event is self-contained; implementations must not rely on
/// cross-event ordering.
#[async_trait]
pub trait RemoteSink: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: &DomainEvent) -> Result<(), SinkError>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str {
        "remote"
    }
}
