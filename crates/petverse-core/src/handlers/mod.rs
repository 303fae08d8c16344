//! Domain handlers, one module per feature.
//!
//! Every feature contributes two things at startup: its routes (message
//! type to validator) and its bus subscriptions (`<Requested>` event to
//! handler). [`game_router`] and [`game_bus`] assemble all four features.
//!
//! Handlers run on the room task with exclusive access to the
//! [`RoomContext`]. Business-rule failures are not handler errors: they are
//! queued as failed replies and reach the client as `success: false`
//! envelopes. A [`HandlerError`] means the bus wiring is wrong.

use petverse_events::{EventBusBuilder, HandlerError};
use petverse_types::DomainEvent;

use crate::context::RoomContext;
use crate::router::{MessageRouter, RouterBuilder};

pub mod food;
pub mod inventory;
pub mod pet;
pub mod player;

/// Signature shared by every domain handler.
pub type GameHandler = fn(&DomainEvent, &mut RoomContext) -> Result<(), HandlerError>;

/// Router with every feature's routes registered.
pub fn game_router() -> MessageRouter {
    let router = RouterBuilder::new();
    let router = pet::routes(router);
    let router = food::routes(router);
    let router = inventory::routes(router);
    player::routes(router).build()
}

/// Bus builder with every feature's handlers subscribed.
///
/// Returned unbuilt so the caller can attach a remote sink.
pub fn game_bus() -> EventBusBuilder<RoomContext> {
    let bus = EventBusBuilder::new();
    let bus = pet::subscribe(bus);
    let bus = food::subscribe(bus);
    let bus = inventory::subscribe(bus);
    player::subscribe(bus)
}

fn unexpected(event: &DomainEvent) -> HandlerError {
    HandlerError::UnexpectedPayload {
        event: event.name.to_string(),
    }
}

/// The `page`th slice of `limit` entries (1-based) and the total count.
pub(crate) fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> (Vec<T>, usize) {
    let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
    let skip = usize::try_from(page.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .saturating_mul(limit);
    let slice = items.iter().skip(skip).take(limit).cloned().collect();
    (slice, items.len())
}
