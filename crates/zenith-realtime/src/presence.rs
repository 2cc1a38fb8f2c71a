//! # Presence
//!
//! One [`PresenceState`] per connection per room. Presence is kept alive by
//! heartbeats; entries whose last heartbeat is older than the timeout are
//! removed by [`crate::RealtimeHub::sweep_stale`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default presence timeout: 60 seconds without a heartbeat.
pub const DEFAULT_PRESENCE_TIMEOUT_SECS: i64 = 60;

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceState {
    pub user_id: String,
    pub connection_id: Uuid,
    /// Caller-supplied state (display name, cursor, ...).
    pub metadata: Value,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl PresenceState {
    pub fn new(user_id: impl Into<String>, connection_id: Uuid, metadata: Value) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            connection_id,
            metadata,
            joined_at: now,
            last_seen: now,
        }
    }

    /// Record a heartbeat.
    pub fn heartbeat(&mut self) {
        self.last_seen = Utc::now();
    }

    /// True when no heartbeat arrived within `timeout` of `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_seen > timeout
    }

    /// [`Self::is_stale_at`] against the current time.
    pub fn is_stale(&self, timeout: Duration) -> bool {
        self.is_stale_at(Utc::now(), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_not_stale() {
        let state = PresenceState::new("u1", Uuid::new_v4(), Value::Null);
        assert!(!state.is_stale(Duration::seconds(DEFAULT_PRESENCE_TIMEOUT_SECS)));
        assert_eq!(state.joined_at, state.last_seen);
    }

    #[test]
    fn stale_after_timeout() {
        let state = PresenceState::new("u1", Uuid::new_v4(), Value::Null);
        let later = state.last_seen + Duration::seconds(61);
        assert!(state.is_stale_at(later, Duration::seconds(60)));
        let boundary = state.last_seen + Duration::seconds(60);
        assert!(!state.is_stale_at(boundary, Duration::seconds(60)));
    }

    #[test]
    fn heartbeat_moves_last_seen_forward() {
        let mut state = PresenceState::new("u1", Uuid::new_v4(), Value::Null);
        let before = state.last_seen;
        state.heartbeat();
        assert!(state.last_seen >= before);
        assert_eq!(state.joined_at, before);
    }
}
