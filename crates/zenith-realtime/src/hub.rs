//! # Realtime Hub
//!
//! Connection registry and room fan-out. A [`RealtimeHub`] is a cheap,
//! cloneable handle; every clone sees the same rooms and connections.
//!
//! ## Locking
//!
//! Two `parking_lot::RwLock`s guard the registry. When both are needed the
//! rooms lock is always taken first. Delivery goes through unbounded
//! channels, so no lock is held across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{RealtimeError, RealtimeResult};
use crate::event::{PresenceKind, RealtimeEvent};
use crate::presence::PresenceState;

/// Limits applied to broadcasts.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Messages a connection may send per one-second window.
    pub max_per_second: usize,
    /// Largest serialized payload accepted, in bytes.
    pub max_message_size: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_per_second: 10,
            max_message_size: 64 * 1024,
        }
    }
}

/// Receiving side of an open connection.
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    user_id: String,
    receiver: mpsc::UnboundedReceiver<RealtimeEvent>,
}

impl Connection {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Wait for the next event. `None` once the hub drops the connection.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Debug)]
struct ConnectionEntry {
    user_id: String,
    sender: mpsc::UnboundedSender<RealtimeEvent>,
    rooms: HashSet<String>,
    /// (messages in window, window start)
    window: (usize, DateTime<Utc>),
}

type Rooms = HashMap<String, HashMap<Uuid, PresenceState>>;
type Connections = HashMap<Uuid, ConnectionEntry>;

#[derive(Debug, Default)]
struct HubInner {
    config: HubConfig,
    rooms: RwLock<Rooms>,
    connections: RwLock<Connections>,
}

/// Shared registry of connections and rooms.
#[derive(Debug, Clone, Default)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                config,
                ..Default::default()
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    // -- Connections ----------------------------------------------------------

    /// Open a connection for `user_id`.
    pub fn connect(&self, user_id: impl Into<String>) -> Connection {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let user_id = user_id.into();
        self.inner.connections.write().insert(
            id,
            ConnectionEntry {
                user_id: user_id.clone(),
                sender,
                rooms: HashSet::new(),
                window: (0, Utc::now()),
            },
        );
        tracing::debug!(connection = %id, user = %user_id, "realtime connection opened");
        Connection {
            id,
            user_id,
            receiver,
        }
    }

    /// Close a connection, leaving every room it joined.
    pub fn disconnect(&self, id: Uuid) -> RealtimeResult<()> {
        let mut rooms = self.inner.rooms.write();
        let mut connections = self.inner.connections.write();
        let entry = connections
            .remove(&id)
            .ok_or(RealtimeError::ConnectionNotFound(id))?;
        for room in &entry.rooms {
            remove_member(&mut rooms, &connections, room, id);
        }
        tracing::debug!(connection = %id, rooms = entry.rooms.len(), "realtime connection closed");
        Ok(())
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.read().len()
    }

    // -- Rooms ----------------------------------------------------------------

    /// Add a connection to `room`, creating the room on first join.
    /// Every member, the joiner included, receives a join event.
    pub fn join(&self, id: Uuid, room: &str, metadata: Value) -> RealtimeResult<PresenceState> {
        let mut rooms = self.inner.rooms.write();
        let mut connections = self.inner.connections.write();

        let entry = connections
            .get_mut(&id)
            .ok_or(RealtimeError::ConnectionNotFound(id))?;
        entry.rooms.insert(room.to_string());
        let state = PresenceState::new(entry.user_id.clone(), id, metadata);

        let members = rooms.entry(room.to_string()).or_default();
        members.insert(id, state.clone());

        let event = presence_event(room, PresenceKind::Join, &state);
        deliver(&connections, members.keys(), &event, None);
        tracing::debug!(connection = %id, room, "joined room");
        Ok(state)
    }

    /// Remove a connection from `room`. The remaining members receive a
    /// leave event; an emptied room is dropped.
    pub fn leave(&self, id: Uuid, room: &str) -> RealtimeResult<()> {
        let mut rooms = self.inner.rooms.write();
        let mut connections = self.inner.connections.write();

        let is_member = rooms
            .get(room)
            .ok_or_else(|| RealtimeError::RoomNotFound(room.to_string()))?
            .contains_key(&id);
        if !is_member {
            return Err(RealtimeError::ConnectionNotFound(id));
        }
        if let Some(entry) = connections.get_mut(&id) {
            entry.rooms.remove(room);
        }
        remove_member(&mut rooms, &connections, room, id);
        Ok(())
    }

    /// Names of all rooms with at least one member, sorted.
    pub fn rooms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.rooms.read().keys().cloned().collect();
        names.sort();
        names
    }

    // -- Broadcast ------------------------------------------------------------

    /// Send `event` with `payload` to every member of `room` except
    /// `exclude`, returning how many members it was delivered to.
    ///
    /// A `sender` connection is charged against its per-second budget.
    /// `sender: None` marks a server-originated message, which is never
    /// rate limited.
    pub fn broadcast(
        &self,
        room: &str,
        event: &str,
        payload: Value,
        sender: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> RealtimeResult<usize> {
        let rooms = self.inner.rooms.read();
        let mut connections = self.inner.connections.write();

        let members = rooms
            .get(room)
            .ok_or_else(|| RealtimeError::RoomNotFound(room.to_string()))?;

        // Rejected messages are not charged against the sender.
        let size = serde_json::to_vec(&payload).map(|b| b.len()).unwrap_or(0);
        if size > self.inner.config.max_message_size {
            return Err(RealtimeError::MessageTooLarge(
                self.inner.config.max_message_size,
            ));
        }

        if let Some(sender) = sender {
            let entry = connections
                .get_mut(&sender)
                .ok_or(RealtimeError::ConnectionNotFound(sender))?;
            charge(entry, self.inner.config.max_per_second, Utc::now())?;
        }

        let event = RealtimeEvent::Broadcast {
            room: room.to_string(),
            event: event.to_string(),
            payload,
            sender,
            timestamp: Utc::now(),
        };
        let delivered = deliver(&connections, members.keys(), &event, exclude);
        tracing::debug!(room, delivered, "broadcast");
        Ok(delivered)
    }

    // -- Presence -------------------------------------------------------------

    /// Members of `room`, oldest join first.
    pub fn presence(&self, room: &str) -> RealtimeResult<Vec<PresenceState>> {
        let rooms = self.inner.rooms.read();
        let members = rooms
            .get(room)
            .ok_or_else(|| RealtimeError::RoomNotFound(room.to_string()))?;
        let mut states: Vec<PresenceState> = members.values().cloned().collect();
        states.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        Ok(states)
    }

    /// Refresh the connection's presence in every room it has joined.
    pub fn heartbeat(&self, id: Uuid) -> RealtimeResult<()> {
        let mut rooms = self.inner.rooms.write();
        let connections = self.inner.connections.read();
        let entry = connections
            .get(&id)
            .ok_or(RealtimeError::ConnectionNotFound(id))?;
        for room in &entry.rooms {
            if let Some(state) = rooms.get_mut(room).and_then(|m| m.get_mut(&id)) {
                state.heartbeat();
            }
        }
        Ok(())
    }

    /// Drop presence entries with no heartbeat within `timeout`. Returns
    /// the number of entries removed. Connections stay open.
    pub fn sweep_stale(&self, timeout: Duration) -> usize {
        self.sweep_stale_at(Utc::now(), timeout)
    }

    /// [`Self::sweep_stale`] evaluated at `now`.
    pub fn sweep_stale_at(&self, now: DateTime<Utc>, timeout: Duration) -> usize {
        let mut rooms = self.inner.rooms.write();
        let mut connections = self.inner.connections.write();

        let stale: Vec<(String, Uuid)> = rooms
            .iter()
            .flat_map(|(room, members)| {
                members
                    .values()
                    .filter(move |state| state.is_stale_at(now, timeout))
                    .map(move |state| (room.clone(), state.connection_id))
            })
            .collect();

        for (room, id) in &stale {
            if let Some(entry) = connections.get_mut(id) {
                entry.rooms.remove(room);
            }
            remove_member(&mut rooms, &connections, room, *id);
        }
        if !stale.is_empty() {
            tracing::info!(removed = stale.len(), "swept stale presence");
        }
        stale.len()
    }

    /// Run [`Self::sweep_stale`] every `every` on the tokio runtime.
    pub fn spawn_sweeper(
        &self,
        every: std::time::Duration,
        timeout: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                hub.sweep_stale(timeout);
            }
        })
    }
}

// -- Helpers ------------------------------------------------------------------

fn presence_event(room: &str, kind: PresenceKind, state: &PresenceState) -> RealtimeEvent {
    RealtimeEvent::Presence {
        room: room.to_string(),
        kind,
        user_id: state.user_id.clone(),
        connection_id: state.connection_id,
        metadata: state.metadata.clone(),
        timestamp: Utc::now(),
    }
}

/// Send `event` to each member still connected. Returns the delivered count.
fn deliver<'a>(
    connections: &Connections,
    members: impl Iterator<Item = &'a Uuid>,
    event: &RealtimeEvent,
    exclude: Option<Uuid>,
) -> usize {
    members
        .filter(|id| Some(**id) != exclude)
        .filter_map(|id| connections.get(id))
        .filter(|entry| entry.sender.send(event.clone()).is_ok())
        .count()
}

/// Remove `id` from `room`, notify the rest, drop the room if now empty.
fn remove_member(rooms: &mut Rooms, connections: &Connections, room: &str, id: Uuid) {
    let Some(members) = rooms.get_mut(room) else {
        return;
    };
    let Some(state) = members.remove(&id) else {
        return;
    };
    let event = presence_event(room, PresenceKind::Leave, &state);
    deliver(connections, members.keys(), &event, None);
    if members.is_empty() {
        rooms.remove(room);
    }
}

/// Count one message against the connection's one-second window.
fn charge(entry: &mut ConnectionEntry, max_per_second: usize, now: DateTime<Utc>) -> RealtimeResult<()> {
    let (count, start) = &mut entry.window;
    if now - *start >= Duration::seconds(1) {
        *count = 0;
        *start = now;
    }
    if *count >= max_per_second {
        return Err(RealtimeError::RateLimitExceeded);
    }
    *count += 1;
    Ok(())
}
