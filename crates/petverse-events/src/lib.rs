//! Domain event bus and retry executor for the Petverse session engine.
//!
//! # Modules
//!
//! - [`bus`] -- Frozen subscriber registry with local and remote sinks
//! - [`retry`] -- Fixed-delay bounded retry for external calls
//! - [`sink`] -- Remote broker port
//! - [`error`] -- Handler and sink error types

pub mod bus;
pub mod error;
pub mod retry;
pub mod sink;

pub use bus::{DomainEventBus, EventBusBuilder, Handler, PublishOptions, PublishReport};
pub use error::{HandlerError, SinkError};
pub use retry::{RetryExecutor, retry};
pub use sink::RemoteSink;
