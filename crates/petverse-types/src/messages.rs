//! Wire envelopes exchanged with game clients.
//!
//! Inbound frames are `{ "type": <string>, "payload": <any> }`. The payload
//! stays untyped until the router validates it. Outbound results mirror the
//! request type with a `_response` suffix and always carry a
//! [`ResponseEnvelope`]. State replication uses [`StateUpdate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// A raw inbound message as received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InboundMessage {
    /// Message type name. Unknown names are dropped by the router.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Untyped payload; absent payloads decode as `null`.
    #[serde(default)]
    pub payload: Value,
}

/// Uniform result envelope for every `*_response` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResponseEnvelope {
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable error code on failure, e.g. `INSUFFICIENT_TOKENS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch when the response was produced.
    pub timestamp: i64,
}

impl ResponseEnvelope {
    /// A successful response carrying `data`.
    pub fn ok(data: Value, now: DateTime<Utc>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            timestamp: now.timestamp_millis(),
        }
    }

    /// A failed response with an error code and message.
    pub fn failure(code: &str, message: String, now: DateTime<Utc>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            error: Some(code.to_owned()),
            timestamp: now.timestamp_millis(),
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A message pushed to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OutboundMessage {
    /// `<request type>_response`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// The result envelope.
    pub payload: ResponseEnvelope,
}

// ---------------------------------------------------------------------------
// State replication
// ---------------------------------------------------------------------------

/// Kind of change in a [`PatchOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PatchKind {
    /// A path that did not exist before.
    Add,
    /// A path whose value changed.
    Replace,
    /// A path that no longer exists.
    Remove,
}

/// One changed path in the replicated tree.
///
/// Paths use JSON-pointer syntax (`/pets/<id>/hunger/value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PatchOp {
    /// What happened at `path`.
    pub op: PatchKind,
    /// JSON pointer to the changed node.
    pub path: String,
    /// New value for `add`/`replace`; absent for `remove`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Replicated-state broadcast sent to every client of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StateUpdate {
    /// The whole tree. Sent to newly joined clients.
    State {
        /// Store version this encoding corresponds to.
        version: u64,
        /// Encoded tree.
        state: Value,
    },
    /// Changes since the previous version.
    StatePatch {
        /// Store version after applying `ops`.
        version: u64,
        /// Changed paths.
        ops: Vec<PatchOp>,
    },
}

impl StateUpdate {
    /// Store version carried by the update.
    pub const fn version(&self) -> u64 {
        match self {
            Self::State { version, .. } | Self::StatePatch { version, .. } => *version,
        }
    }
}
