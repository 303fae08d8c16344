//! Background startup helper for the engine binary.
//!
//! [`spawn_server`] launches the HTTP and `WebSocket` server on its own
//! Tokio task so the binary can wait for a shutdown signal alongside it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the server on a background task.
///
/// The task ends when `shutdown` resolves and in-flight connections have
/// drained.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if `config` does not form a valid
/// socket address. Bind failures are logged from the background task.
pub fn spawn_server<F>(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<JoinHandle<()>, StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr_str = format!("{}:{}", config.host, config.port);
    let _: SocketAddr = addr_str.parse().map_err(|e| {
        StartupError::Server(ServerError::Bind(format!("invalid address {addr_str}: {e}")))
    })?;

    let port = config.port;
    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(&config, state, shutdown).await {
            tracing::error!(error = %e, "server exited with error");
        }
    });

    tracing::info!(port, "server spawned on background task");

    Ok(handle)
}
