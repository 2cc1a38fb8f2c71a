//! # Realtime Events
//!
//! Everything a connection receives arrives as a [`RealtimeEvent`]. The
//! serialized form is tagged by `type`:
//!
//! ```json
//! { "type": "broadcast", "room": "lobby", "event": "chat", "payload": {...}, ... }
//! { "type": "presence", "room": "lobby", "kind": "join", "userId": "u1", ... }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Whether a member arrived or departed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceKind {
    Join,
    Leave,
}

/// An event delivered to room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RealtimeEvent {
    /// Application message sent to a room.
    #[serde(rename_all = "camelCase")]
    Broadcast {
        room: String,
        event: String,
        payload: Value,
        /// Sending connection, `None` for server-originated messages.
        sender: Option<Uuid>,
        timestamp: DateTime<Utc>,
    },
    /// Membership change in a room.
    #[serde(rename_all = "camelCase")]
    Presence {
        room: String,
        kind: PresenceKind,
        user_id: String,
        connection_id: Uuid,
        metadata: Value,
        timestamp: DateTime<Utc>,
    },
}

impl RealtimeEvent {
    /// Room the event belongs to.
    pub fn room(&self) -> &str {
        match self {
            Self::Broadcast { room, .. } | Self::Presence { room, .. } => room,
        }
    }

    /// Topic string, `room:<name>`.
    pub fn topic(&self) -> String {
        format!("room:{}", self.room())
    }
}
