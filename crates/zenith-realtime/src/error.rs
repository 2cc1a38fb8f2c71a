//! # Realtime Errors

use thiserror::Error;
use uuid::Uuid;

/// Result alias for hub operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Failures reported by [`crate::RealtimeHub`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    /// No room with this name has any members.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// The connection was never opened or has been closed.
    #[error("connection not found: {0}")]
    ConnectionNotFound(Uuid),

    /// The sending connection exceeded its per-second message budget.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// The serialized payload exceeds the configured maximum.
    #[error("message too large (max: {0} bytes)")]
    MessageTooLarge(usize),
}
