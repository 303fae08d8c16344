//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in a session has a strongly-typed ID so that a pet id can
//! never be passed where a player id is expected. All IDs use UUID v7
//! (time-ordered), which keeps Dragonfly key scans roughly chronological.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a running game session.
    SessionId
}

define_id! {
    /// Unique identifier for a player.
    PlayerId
}

define_id! {
    /// Unique identifier for a pet.
    PetId
}

define_id! {
    /// Unique identifier for a waste object left behind by a pet.
    WasteId
}

define_id! {
    /// Unique identifier for a published domain event.
    EventId
}

define_id! {
    /// Unique identifier for one connected client (a single socket).
    ///
    /// A player reconnecting gets a fresh client id but keeps its player id.
    ClientId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = PetId::new();
        let b = PetId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_parse_agree() {
        let id = PlayerId::new();
        let parsed: Result<PlayerId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
    }
}
