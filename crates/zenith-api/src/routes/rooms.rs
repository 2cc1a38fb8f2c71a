//! # Room Routes
//!
//! HTTP access to the realtime hub. Clients that hold a realtime
//! connection pass its id as `sender`; the message is then charged to that
//! connection's rate limit and not echoed back to it.

use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use zenith_realtime::PresenceState;
use zenith_schema::prelude::*;

use crate::error::AppError;
use crate::response;
use crate::route::{RouteSchemas, ValidatedRequest};
use crate::routes::bind;
use crate::state::AppState;

/// Path parameters of `/api/rooms/{room}/...`.
pub fn room_params() -> ObjectSchema {
    f::object().field("room", f::string().min(1).max(64))
}

/// Body of `POST /api/rooms/{room}/messages`.
pub fn message_schema() -> ObjectSchema {
    f::object()
        .field("event", f::string().trim().min(1).max(64))
        .field("payload", f::object().passthrough().optional())
        .field("sender", f::string().uuid().optional())
}

#[derive(Debug, Deserialize)]
struct RoomPath {
    room: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    event: String,
    payload: Option<Value>,
    sender: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct Presence {
    room: String,
    members: Vec<PresenceState>,
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route(
            "/api/rooms",
            get(bind(state, RouteSchemas::new(), list_rooms)),
        )
        .route(
            "/api/rooms/{room}/messages",
            post(bind(
                state,
                RouteSchemas::new()
                    .params(room_params())
                    .body(message_schema()),
                post_message,
            )),
        )
        .route(
            "/api/rooms/{room}/presence",
            get(bind(
                state,
                RouteSchemas::new().params(room_params()),
                room_presence,
            )),
        )
}

/// GET /api/rooms
async fn list_rooms(state: AppState, _req: ValidatedRequest) -> Result<Response, AppError> {
    Ok(response::json(&json!({ "rooms": state.realtime.rooms() })))
}

/// POST /api/rooms/{room}/messages — broadcast to the room's members.
async fn post_message(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let RoomPath { room } = req.params::<RoomPath>()?;
    let message: Message = req.body()?;
    let delivered = state.realtime.broadcast(
        &room,
        &message.event,
        message.payload.unwrap_or_else(|| json!({})),
        message.sender,
        message.sender,
    )?;
    Ok(response::json(&json!({ "delivered": delivered })))
}

/// GET /api/rooms/{room}/presence
async fn room_presence(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let RoomPath { room } = req.params::<RoomPath>()?;
    let members = state.realtime.presence(&room)?;
    Ok(response::json(&Presence { room, members }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_payload_keeps_unknown_keys() {
        let out = message_schema()
            .safe_parse(&json!({ "event": " chat ", "payload": { "text": "hi", "n": 1 } }))
            .unwrap();
        assert_eq!(out, json!({ "event": "chat", "payload": { "text": "hi", "n": 1 } }));
    }

    #[test]
    fn message_payload_must_be_object() {
        let err = message_schema()
            .safe_parse(&json!({ "event": "chat", "payload": [1, 2] }))
            .unwrap_err();
        assert_eq!(err.path, vec!["payload"]);
        assert_eq!(err.received_type(), "object");
    }

    #[test]
    fn sender_must_be_uuid() {
        let err = message_schema()
            .safe_parse(&json!({ "event": "chat", "sender": "me" }))
            .unwrap_err();
        assert_eq!(err.path, vec!["sender"]);
    }
}
