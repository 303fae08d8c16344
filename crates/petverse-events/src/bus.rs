//! Publish/subscribe bridge between the router and domain handlers.
//!
//! Subscribers are registered on an [`EventBusBuilder`] at startup and the
//! registry is frozen by [`EventBusBuilder::build`]. After that the bus is
//! read-only and can be shared across every session.
//!
//! # Sinks
//!
//! - **Local**: subscribers run synchronously, in registration order, on
//!   the publisher's task. A failing subscriber is logged and the rest
//!   still run.
//! - **Remote**: the event is handed to a spawned task that publishes it
//!   through the [`RemoteSink`] under the bus retry policy. Failures are
//!   logged there and never reach the publisher.

use std::collections::HashMap;
use std::sync::Arc;

use petverse_types::{DomainEvent, EventName};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::HandlerError;
use crate::retry::RetryExecutor;
use crate::sink::RemoteSink;

/// A local subscriber. `C` is the per-publish context (the session the
/// event belongs to).
pub type Handler<C> = Box<dyn Fn(&DomainEvent, &mut C) -> Result<(), HandlerError> + Send + Sync>;

struct Subscriber<C> {
    label: &'static str,
    handler: Handler<C>,
}

/// Per-call switches to skip one of the sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Do not forward to the remote broker.
    pub without_remote: bool,
    /// Do not run local subscribers.
    pub without_local: bool,
}

impl PublishOptions {
    /// Local delivery only.
    pub const fn local_only() -> Self {
        Self {
            without_remote: true,
            without_local: false,
        }
    }

    /// Remote delivery only.
    pub const fn remote_only() -> Self {
        Self {
            without_remote: false,
            without_local: true,
        }
    }
}

/// What happened to one publish call.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Local subscribers that completed without error.
    pub delivered: usize,
    /// Local subscribers that returned an error.
    pub failed: usize,
    /// Handle of the spawned remote publish, if one was scheduled.
    pub remote: Option<JoinHandle<()>>,
}

/// Collects subscribers before the bus is frozen.
pub struct EventBusBuilder<C> {
    subscribers: HashMap<EventName, Vec<Subscriber<C>>>,
    remote: Option<Arc<dyn RemoteSink>>,
    retry: RetryExecutor,
}

impl<C> EventBusBuilder<C> {
    /// An empty builder with no remote sink.
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            remote: None,
            retry: RetryExecutor::none(),
        }
    }

    /// Register `handler` for `name`. Handlers for the same event run in
    /// the order they were registered.
    #[must_use]
    pub fn subscribe<F>(mut self, name: EventName, label: &'static str, handler: F) -> Self
    where
        F: Fn(&DomainEvent, &mut C) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribers.entry(name).or_default().push(Subscriber {
            label,
            handler: Box::new(handler),
        });
        self
    }

    /// Forward every event to `sink`, retrying under `retry`.
    #[must_use]
    pub fn with_remote(mut self, sink: Arc<dyn RemoteSink>, retry: RetryExecutor) -> Self {
        self.remote = Some(sink);
        self.retry = retry;
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> DomainEventBus<C> {
        let subscribers = self
            .subscribers
            .into_iter()
            .map(|(name, subs)| (name, subs.into_boxed_slice()))
            .collect();
        DomainEventBus {
            subscribers,
            remote: self.remote,
            retry: self.retry,
        }
    }
}

impl<C> Default for EventBusBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen event bus.
pub struct DomainEventBus<C> {
    subscribers: HashMap<EventName, Box<[Subscriber<C>]>>,
    remote: Option<Arc<dyn RemoteSink>>,
    retry: RetryExecutor,
}

impl<C> std::fmt::Debug for DomainEventBus<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainEventBus")
            .field("events", &self.subscribers.len())
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .field("retry", &self.retry)
            .finish()
    }
}

impl<C> DomainEventBus<C> {
    /// Start a new registry.
    pub fn builder() -> EventBusBuilder<C> {
        EventBusBuilder::new()
    }

    /// Number of local subscribers registered for `name`.
    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.subscribers.get(&name).map_or(0, |s| s.len())
    }

    /// Whether a remote sink is attached.
    pub const fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Publish `event`.
    ///
    /// Local subscribers have all run by the time this returns. The remote
    /// publish, if any, has only been scheduled.
    pub fn publish(&self, event: &DomainEvent, ctx: &mut C, options: PublishOptions) -> PublishReport {
        let mut report = PublishReport::default();

        if !options.without_local {
            self.deliver_local(event, ctx, &mut report);
        }

        if !options.without_remote {
            report.remote = self.schedule_remote(event);
        }

        report
    }

    fn deliver_local(&self, event: &DomainEvent, ctx: &mut C, report: &mut PublishReport) {
        let Some(subscribers) = self.subscribers.get(&event.name) else {
            debug!(event = %event.name, "no local subscribers");
            return;
        };

        for sub in subscribers {
            match (sub.handler)(event, ctx) {
                Ok(()) => {
                    report.delivered = report.delivered.saturating_add(1);
                }
                Err(e) => {
                    report.failed = report.failed.saturating_add(1);
                    error!(
                        event = %event.name,
                        event_id = %event.id,
                        subscriber = sub.label,
                        error = %e,
                        "local subscriber failed"
                    );
                }
            }
        }
    }

    fn schedule_remote(&self, event: &DomainEvent) -> Option<JoinHandle<()>> {
        let sink = Arc::clone(self.remote.as_ref()?);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(event = %event.name, "no async runtime, remote publish skipped");
            return None;
        };

        let retry = self.retry;
        let event = event.clone();
        Some(runtime.spawn(async move {
            let operation = format!("{} publish {}", sink.name(), event.name);
            let result = retry
                .run(&operation, || {
                    let sink = Arc::clone(&sink);
                    let event = &event;
                    async move { sink.publish(event).await }
                })
                .await;
            if let Err(e) = result {
                warn!(
                    event = %event.name,
                    event_id = %event.id,
                    sink = sink.name(),
                    error = %e,
                    "remote publish dropped"
                );
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use petverse_types::{
        ActionRequest, ClientId, EventOrigin, MessageType, PlayerId, SessionId,
    };

    use super::*;
    use crate::error::SinkError;

    fn event(req: ActionRequest) -> DomainEvent {
        let origin = EventOrigin {
            session_id: SessionId::new(),
            client_id: ClientId::new(),
            player_id: PlayerId::new(),
        };
        DomainEvent::requested(req, origin, Utc::now())
    }

    fn profile_event() -> DomainEvent {
        event(ActionRequest::Profile)
    }

    fn profile() -> EventName {
        EventName::requested(MessageType::GetProfile)
    }

    struct FailingSink {
        attempts: Arc<AtomicU32>,
    }

    #[async_trait]
    impl RemoteSink for FailingSink {
        async fn publish(&self, _event: &DomainEvent) -> Result<(), SinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::Unavailable(String::from("broker down")))
        }
    }

    struct CountingSink {
        published: Arc<AtomicU32>,
    }

    #[async_trait]
    impl RemoteSink for CountingSink {
        async fn publish(&self, _event: &DomainEvent) -> Result<(), SinkError> {
            self.published.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = DomainEventBus::<Vec<&'static str>>::builder()
            .subscribe(profile(), "first", |_, log| {
                log.push("first");
                Ok(())
            })
            .subscribe(profile(), "second", |_, log| {
                log.push("second");
                Ok(())
            })
            .build();

        let mut log = Vec::new();
        let report = bus.publish(&profile_event(), &mut log, PublishOptions::default());
        assert_eq!(log, vec!["first", "second"]);
        assert_eq!(report.delivered, 2);
        assert!(report.remote.is_none());
    }

    #[test]
    fn failing_handler_does_not_stop_the_rest() {
        let bus = DomainEventBus::<Vec<&'static str>>::builder()
            .subscribe(profile(), "a", |_, log| {
                log.push("a");
                Ok(())
            })
            .subscribe(profile(), "boom", |_, _| {
                Err(HandlerError::Failed(String::from("boom")))
            })
            .subscribe(profile(), "c", |_, log| {
                log.push("c");
                Ok(())
            })
            .build();

        let mut log = Vec::new();
        let report = bus.publish(&profile_event(), &mut log, PublishOptions::default());
        assert_eq!(log, vec!["a", "c"]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn events_only_reach_their_own_subscribers() {
        let bus = DomainEventBus::<u32>::builder()
            .subscribe(profile(), "count", |_, n| {
                *n = n.saturating_add(1);
                Ok(())
            })
            .build();

        let mut n = 0;
        bus.publish(&event(ActionRequest::GameConfig), &mut n, PublishOptions::default());
        assert_eq!(n, 0);
        assert_eq!(bus.subscriber_count(profile()), 1);
        assert_eq!(
            bus.subscriber_count(EventName::requested(MessageType::RequestGameConfig)),
            0
        );
    }

    #[test]
    fn without_local_skips_subscribers() {
        let bus = DomainEventBus::<u32>::builder()
            .subscribe(profile(), "count", |_, n| {
                *n = n.saturating_add(1);
                Ok(())
            })
            .build();

        let mut n = 0;
        bus.publish(&profile_event(), &mut n, PublishOptions::remote_only());
        assert_eq!(n, 0);
    }

    #[test]
    fn publish_without_runtime_still_delivers_locally() {
        let attempts = Arc::new(AtomicU32::new(0));
        let sink = Arc::new(FailingSink {
            attempts: Arc::clone(&attempts),
        });
        let bus = DomainEventBus::<u32>::builder()
            .subscribe(profile(), "count", |_, n| {
                *n = n.saturating_add(1);
                Ok(())
            })
            .with_remote(sink, RetryExecutor::none())
            .build();

        let mut n = 0;
        let report = bus.publish(&profile_event(), &mut n, PublishOptions::default());
        assert_eq!(n, 1);
        assert!(report.remote.is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_failure_is_retried_and_swallowed() {
        let attempts = Arc::new(AtomicU32::new(0));
        let sink = Arc::new(FailingSink {
            attempts: Arc::clone(&attempts),
        });
        let bus = DomainEventBus::<u32>::builder()
            .subscribe(profile(), "count", |_, n| {
                *n = n.saturating_add(1);
                Ok(())
            })
            .with_remote(sink, RetryExecutor::new(2, Duration::from_millis(1)))
            .build();

        let mut n = 0;
        let report = bus.publish(&profile_event(), &mut n, PublishOptions::default());
        assert_eq!(n, 1);

        let remote = report.remote;
        assert!(remote.is_some());
        if let Some(handle) = remote {
            assert!(handle.await.is_ok());
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn without_remote_skips_the_sink() {
        let published = Arc::new(AtomicU32::new(0));
        let sink = Arc::new(CountingSink {
            published: Arc::clone(&published),
        });
        let bus = DomainEventBus::<u32>::builder()
            .with_remote(sink, RetryExecutor::none())
            .build();

        let mut n = 0;
        let report = bus.publish(&profile_event(), &mut n, PublishOptions::local_only());
        assert!(report.remote.is_none());

        let report = bus.publish(&profile_event(), &mut n, PublishOptions::default());
        if let Some(handle) = report.remote {
            assert!(handle.await.is_ok());
        }
        assert_eq!(published.load(Ordering::SeqCst), 1);
    }
}
