//! # zenith-realtime — Rooms, Broadcast & Presence
//!
//! In-process realtime fan-out for Zenith applications. Transport is left
//! to the caller (WebSocket, SSE, long-poll): a transport opens a
//! [`Connection`] per client, forwards its [`RealtimeEvent`]s, and calls
//! [`RealtimeHub`] operations on behalf of the client.
//!
//! ```
//! use zenith_realtime::RealtimeHub;
//! use serde_json::json;
//!
//! let hub = RealtimeHub::new();
//! let alice = hub.connect("alice");
//! let mut bob = hub.connect("bob");
//! hub.join(alice.id(), "lobby", json!({})).unwrap();
//! hub.join(bob.id(), "lobby", json!({})).unwrap();
//!
//! let delivered = hub
//!     .broadcast("lobby", "chat", json!({ "text": "hi" }), Some(alice.id()), Some(alice.id()))
//!     .unwrap();
//! assert_eq!(delivered, 1);
//! ```
//!
//! ## Limits
//!
//! - 10 messages per second per sending connection.
//! - 64 KiB maximum serialized payload.
//! - Presence expires after 60 seconds without a heartbeat.

pub mod error;
pub mod event;
pub mod hub;
pub mod presence;

pub use error::{RealtimeError, RealtimeResult};
pub use event::{PresenceKind, RealtimeEvent};
pub use hub::{Connection, HubConfig, RealtimeHub};
pub use presence::{PresenceState, DEFAULT_PRESENCE_TIMEOUT_SECS};
