//! Assembles [`RoomDeps`] from configuration.

use std::sync::Arc;

use petverse_events::RemoteSink;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::handlers::{game_bus, game_router};
use crate::persistence::PersistencePort;
use crate::room::RoomDeps;

/// Build the bus, router, and room policy for every session.
///
/// With `remote` set, every published event is also forwarded to the
/// broker under the configured retry policy.
pub fn room_deps(
    config: &AppConfig,
    persistence: Arc<dyn PersistencePort>,
    clock: Arc<dyn Clock>,
    remote: Option<Arc<dyn RemoteSink>>,
) -> RoomDeps {
    let retry = config.infrastructure.retry();
    let mut bus = game_bus();
    if let Some(sink) = remote {
        bus = bus.with_remote(sink, retry);
    }

    RoomDeps {
        bus: Arc::new(bus.build()),
        router: Arc::new(game_router()),
        retry,
        persistence,
        rules: Arc::new(config.rules()),
        clock,
        grace_period: config.session.grace_period(),
        outbound_buffer: config.session.outbound_buffer,
        command_buffer: config.session.command_buffer,
    }
}
