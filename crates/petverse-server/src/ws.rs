//! `WebSocket` transport for game clients.
//!
//! Clients connect to `GET /ws/sessions/{id}?wallet=..&name=..`. The
//! identity in the query string is assumed to have been verified by the
//! gateway in front of this server.
//!
//! After the upgrade the client receives the full state, then a mix of
//! `*_response` messages addressed to it and `state_patch` broadcasts for
//! the whole session. Text frames from the client are parsed as
//! [`InboundMessage`] and routed to the room; malformed frames are
//! dropped.
//!
//! A client that falls behind the state broadcast is sent a fresh full
//! state. Patches already queued behind it carry lower versions and should
//! be ignored by the client.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use petverse_core::RoomHandle;
use petverse_types::{InboundMessage, PlayerIdentity};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::handlers::parse_session_id;
use crate::state::AppState;

/// Query parameters of the `WebSocket` endpoint.
#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    /// Wallet address of the authenticated player.
    pub wallet: String,
    /// Display name; defaults to the wallet address.
    pub name: Option<String>,
}

impl JoinQuery {
    fn into_identity(self) -> Result<PlayerIdentity, ApiError> {
        let wallet = self.wallet.trim().to_owned();
        if wallet.is_empty() {
            return Err(ApiError::BadRequest(String::from("wallet must not be empty")));
        }
        let display_name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| wallet.clone());
        Ok(PlayerIdentity {
            wallet,
            display_name,
        })
    }
}

/// Upgrade to a `WebSocket` and join the session.
///
/// # Route
///
/// `GET /ws/sessions/{id}`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    Query(query): Query<JoinQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let session_id = parse_session_id(&id)?;
    let identity = query.into_identity()?;
    let room = state.registry.get_or_create(session_id).await;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, room, identity)))
}

async fn send_json<T: Serialize + Sync>(
    socket: &mut WebSocket,
    value: &T,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "failed to serialize outbound frame");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

async fn handle_ws(mut socket: WebSocket, room: RoomHandle, identity: PlayerIdentity) {
    let session_id = room.session_id();
    let mut ticket = match room.join(identity).await {
        Ok(ticket) => ticket,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "join failed");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    let client_id = ticket.client_id;
    info!(session_id = %session_id, client_id = %client_id, "WebSocket client joined");

    if send_json(&mut socket, &ticket.snapshot).await.is_ok() {
        loop {
            tokio::select! {
                outbound = ticket.outbound.recv() => {
                    let Some(message) = outbound else {
                        debug!(client_id = %client_id, "room closed the outbound channel");
                        break;
                    };
                    if send_json(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
                update = ticket.updates.recv() => {
                    let update = match update {
                        Ok(update) => update,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(client_id = %client_id, skipped, "client lagged, resyncing");
                            match room.full_state().await {
                                Ok(full) => full,
                                Err(_closed) => break,
                            }
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if send_json(&mut socket, &update).await.is_err() {
                        break;
                    }
                }
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<InboundMessage>(text.as_str()) {
                            Ok(message) => {
                                if let Err(e) = room.send(client_id, message).await {
                                    debug!(client_id = %client_id, error = %e, "room rejected message");
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!(client_id = %client_id, error = %e, "dropping malformed frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(client_id = %client_id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    if let Err(e) = room.leave(client_id).await {
        debug!(client_id = %client_id, error = %e, "leave after disconnect failed");
    }
    info!(session_id = %session_id, client_id = %client_id, "WebSocket client left");
}
