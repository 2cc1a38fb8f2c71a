//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//!
//! ## Wire Formats
//!
//! - Validation failures use the field-addressable body
//!   `{ "error": "Validation Error", "details": [{ path, message, received }] }`.
//! - Everything else uses `{ "error": "<message>" }`.
//!
//! Malformed client input always maps to a 4xx. Handler faults map to a
//! 500 whose body never carries internal details; the cause is logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zenith_cache::CacheError;
use zenith_realtime::RealtimeError;
use zenith_schema::{ParseError, ValidationFailure};

/// Message returned for undecodable JSON request bodies.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON body";

/// Message returned for every 500.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Plain JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Input failed schema validation (400 unless the failure overrides it).
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Request body was not valid JSON (400). The reason is logged only.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// Malformed request outside schema validation (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request conflicts with existing state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Payload over a configured size limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Client is sending too fast (429).
    #[error("too many requests: {0}")]
    TooManyRequests(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),

    /// Fault raised by handler code (500). Logged, never returned to client.
    #[error("handler error: {0:#}")]
    Handler(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(failure) => {
                StatusCode::from_u16(failure.status()).unwrap_or(StatusCode::BAD_REQUEST)
            }
            Self::InvalidJson(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) | Self::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Construct a not-found error (404).
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Construct an internal error (500).
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Self::Validation(failure) => {
                tracing::debug!(error = %failure, "request failed validation");
                return (status, Json(failure.to_body())).into_response();
            }
            Self::InvalidJson(reason) => {
                tracing::debug!(%reason, "undecodable request body");
                INVALID_JSON_MESSAGE.to_string()
            }
            Self::Internal(_) | Self::Handler(_) => {
                tracing::error!(error = %self, "internal server error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::PayloadTooLarge(msg)
            | Self::TooManyRequests(msg) => msg.clone(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// A validated value that does not fit the handler's Rust type is a
/// programming error, not bad input.
impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Invalid(failure) => Self::Validation(failure),
            ParseError::Shape(e) => Self::Internal(format!("validated data shape mismatch: {e}")),
        }
    }
}

impl From<RealtimeError> for AppError {
    fn from(err: RealtimeError) -> Self {
        match &err {
            RealtimeError::RoomNotFound(_) | RealtimeError::ConnectionNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            RealtimeError::RateLimitExceeded => Self::TooManyRequests(err.to_string()),
            RealtimeError::MessageTooLarge(_) => Self::PayloadTooLarge(err.to_string()),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        Self::Internal(err.to_string())
    }
}
