//! Session engine binary for Petverse.
//!
//! Wires configuration, persistence, the optional NATS event sink, and the
//! HTTP/WebSocket server together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `petverse-config.yaml` (or `PETVERSE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Select the persistence backend (memory or Dragonfly)
//! 4. Connect the NATS event sink when enabled
//! 5. Build the session registry and start the server
//! 6. On `Ctrl-C`, flush every session and stop the server

mod error;
mod nats_sink;

use std::path::PathBuf;
use std::sync::Arc;

use petverse_core::config::PersistenceBackend;
use petverse_core::{
    AppConfig, MemoryPersistence, PersistencePort, SessionRegistry, SystemClock, room_deps,
};
use petverse_db::DragonflyPersistence;
use petverse_events::RemoteSink;
use petverse_server::{AppState, ServerConfig, spawn_server};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::nats_sink::NatsSink;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, a required backend, or the server
/// fails to start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_found) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!("petverse-engine starting");
    if !config_found {
        info!("Config file not found, using defaults");
    }
    info!(
        port = config.infrastructure.port,
        persistence = ?config.infrastructure.persistence,
        nats_enabled = config.infrastructure.nats_enabled,
        grace_period_secs = config.session.grace_period_secs,
        pet_types = config.game.pet_types.len(),
        items = config.game.items.len(),
        "Configuration loaded"
    );

    // 3. Persistence backend.
    let persistence: Arc<dyn PersistencePort> = match config.infrastructure.persistence {
        PersistenceBackend::Memory => {
            warn!("using in-memory persistence; player data is lost on restart");
            Arc::new(MemoryPersistence::new())
        }
        PersistenceBackend::Dragonfly => {
            let url = &config.infrastructure.dragonfly_url;
            info!(url = %url, "Connecting to Dragonfly");
            let store = DragonflyPersistence::connect(url)
                .await
                .map_err(EngineError::from)?;
            info!("Dragonfly persistence connected");
            Arc::new(store)
        }
    };

    // 4. Remote event sink.
    let remote: Option<Arc<dyn RemoteSink>> = if config.infrastructure.nats_enabled {
        let url = &config.infrastructure.nats_url;
        info!(url = %url, "Connecting to NATS");
        let sink = NatsSink::connect(url).await.map_err(|e| EngineError::Nats {
            message: format!("{e}"),
        })?;
        info!("NATS event sink connected");
        let sink: Arc<dyn RemoteSink> = Arc::new(sink);
        Some(sink)
    } else {
        None
    };

    // 5. Registry and server.
    let deps = room_deps(&config, persistence, Arc::new(SystemClock), remote);
    let registry = SessionRegistry::new(deps);
    let app_state = Arc::new(AppState::new(registry.clone()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_config = ServerConfig {
        host: String::from("0.0.0.0"),
        port: config.infrastructure.port,
    };
    let server = spawn_server(server_config, app_state, async move {
        let _ = stop_rx.await;
    })
    .map_err(EngineError::from)?;
    info!(port = config.infrastructure.port, "Petverse server started");

    // 6. Wait for Ctrl-C, then flush and stop.
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
    }
    info!("shutdown signal received");

    registry.shutdown_all().await;
    let _ = stop_tx.send(());
    if let Err(e) = server.await {
        warn!(error = %e, "server task ended abnormally");
    }

    info!("petverse-engine stopped");
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load configuration from `PETVERSE_CONFIG` or `petverse-config.yaml`.
///
/// Returns defaults when the file does not exist. The flag reports whether
/// a file was read.
fn load_config() -> Result<(AppConfig, bool), EngineError> {
    let config_path = std::env::var("PETVERSE_CONFIG")
        .map_or_else(|_| PathBuf::from("petverse-config.yaml"), PathBuf::from);
    if config_path.exists() {
        let config = AppConfig::from_file(&config_path)?;
        Ok((config, true))
    } else {
        let mut config = AppConfig::default();
        config.infrastructure.apply_env_overrides();
        Ok((config, false))
    }
}
