//! Inbound message dispatch.
//!
//! The [`MessageRouter`] maps a wire message type to its validator. A
//! message that passes validation becomes a `Requested` [`DomainEvent`] and
//! is published on the bus; anything else is logged and dropped. Nothing
//! here returns an error to the transport.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use petverse_events::{DomainEventBus, PublishOptions};
use petverse_types::{DomainEvent, EventId, EventOrigin, Feature, InboundMessage, MessageType};
use tracing::{debug, warn};

use crate::validation::{FieldError, Validator};

/// A registered route.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    /// Owning feature.
    pub feature: Feature,
    /// Payload validator.
    pub validate: Validator,
}

/// What [`MessageRouter::dispatch`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A `Requested` event was published.
    Published {
        /// Id of the published event.
        event_id: EventId,
        /// The routed message type.
        message_type: MessageType,
    },
    /// The type string names no known message.
    UnknownType(String),
    /// The message type is known but no feature registered it.
    Unrouted(MessageType),
    /// The payload failed validation.
    Rejected {
        /// The routed message type.
        message_type: MessageType,
        /// Why.
        errors: Vec<FieldError>,
    },
}

/// Collects routes before the router is frozen.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: HashMap<MessageType, Route>,
}

impl RouterBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `validate` for `message_type`. Registering a type twice
    /// keeps the later validator.
    #[must_use]
    pub fn route(mut self, message_type: MessageType, validate: Validator) -> Self {
        let route = Route {
            feature: message_type.feature(),
            validate,
        };
        if self.routes.insert(message_type, route).is_some() {
            warn!(message_type = %message_type, "route registered twice, keeping the last");
        }
        self
    }

    /// Freeze the routes.
    pub fn build(self) -> MessageRouter {
        MessageRouter {
            routes: self.routes,
        }
    }
}

/// Frozen message type to validator table.
#[derive(Debug)]
pub struct MessageRouter {
    routes: HashMap<MessageType, Route>,
}

impl MessageRouter {
    /// Start a new route table.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Whether `message_type` has a route.
    pub fn is_routed(&self, message_type: MessageType) -> bool {
        self.routes.contains_key(&message_type)
    }

    /// Number of registered routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Validate `message` and publish it as a `Requested` event.
    ///
    /// Local subscribers have run by the time this returns, but their
    /// results are delivered separately as `*_response` messages.
    pub fn dispatch<C>(
        &self,
        message: &InboundMessage,
        origin: EventOrigin,
        now: DateTime<Utc>,
        bus: &DomainEventBus<C>,
        ctx: &mut C,
    ) -> DispatchOutcome {
        let Ok(message_type) = message.message_type.parse::<MessageType>() else {
            warn!(
                session_id = %origin.session_id,
                client_id = %origin.client_id,
                message_type = message.message_type,
                "dropping message of unknown type"
            );
            return DispatchOutcome::UnknownType(message.message_type.clone());
        };

        let Some(route) = self.routes.get(&message_type) else {
            warn!(message_type = %message_type, "dropping message with no registered route");
            return DispatchOutcome::Unrouted(message_type);
        };

        let request = match (route.validate)(&message.payload) {
            Ok(request) => request,
            Err(errors) => {
                let summary: Vec<String> = errors.iter().map(ToString::to_string).collect();
                warn!(
                    session_id = %origin.session_id,
                    client_id = %origin.client_id,
                    message_type = %message_type,
                    errors = ?summary,
                    "dropping invalid message"
                );
                return DispatchOutcome::Rejected {
                    message_type,
                    errors,
                };
            }
        };

        let event = DomainEvent::requested(request, origin, now);
        let event_id = event.id;
        let report = bus.publish(&event, ctx, PublishOptions::default());
        debug!(
            event = %event.name,
            event_id = %event_id,
            feature = route.feature.as_str(),
            delivered = report.delivered,
            failed = report.failed,
            "request published"
        );

        DispatchOutcome::Published {
            event_id,
            message_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use petverse_events::EventBusBuilder;
    use petverse_types::{ClientId, EventName, PlayerId, SessionId};
    use serde_json::json;

    use super::*;
    use crate::validation;

    fn origin() -> EventOrigin {
        EventOrigin {
            session_id: SessionId::new(),
            client_id: ClientId::new(),
            player_id: PlayerId::new(),
        }
    }

    fn router() -> MessageRouter {
        MessageRouter::builder()
            .route(MessageType::BuyFood, validation::buy_food)
            .build()
    }

    fn counting_bus() -> DomainEventBus<u32> {
        EventBusBuilder::new()
            .subscribe(
                EventName::requested(MessageType::BuyFood),
                "count",
                |_, n: &mut u32| {
                    *n = n.saturating_add(1);
                    Ok(())
                },
            )
            .build()
    }

    fn message(kind: &str, payload: serde_json::Value) -> InboundMessage {
        InboundMessage {
            message_type: String::from(kind),
            payload,
        }
    }

    #[test]
    fn valid_message_is_published() {
        let bus = counting_bus();
        let mut calls = 0;
        let outcome = router().dispatch(
            &message("buy_food", json!({"itemId": "apple", "itemType": "food", "quantity": 2})),
            origin(),
            Utc::now(),
            &bus,
            &mut calls,
        );
        assert!(matches!(
            outcome,
            DispatchOutcome::Published {
                message_type: MessageType::BuyFood,
                ..
            }
        ));
        assert_eq!(calls, 1);
    }

    #[test]
    fn missing_quantity_publishes_nothing() {
        let bus = counting_bus();
        let mut calls = 0;
        let outcome = router().dispatch(
            &message("buy_food", json!({"itemId": "apple", "itemType": "food"})),
            origin(),
            Utc::now(),
            &bus,
            &mut calls,
        );
        assert!(matches!(outcome, DispatchOutcome::Rejected { .. }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn unknown_type_is_dropped() {
        let bus = counting_bus();
        let mut calls = 0;
        let outcome = router().dispatch(
            &message("teleport", json!({})),
            origin(),
            Utc::now(),
            &bus,
            &mut calls,
        );
        assert_eq!(outcome, DispatchOutcome::UnknownType(String::from("teleport")));
        assert_eq!(calls, 0);
    }

    #[test]
    fn known_but_unregistered_type_is_dropped() {
        let bus = counting_bus();
        let mut calls = 0;
        let outcome = router().dispatch(
            &message("get_profile", json!({})),
            origin(),
            Utc::now(),
            &bus,
            &mut calls,
        );
        assert_eq!(outcome, DispatchOutcome::Unrouted(MessageType::GetProfile));
        assert!(!router().is_routed(MessageType::GetProfile));
    }
}
