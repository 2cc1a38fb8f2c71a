//! # Response Helpers
//!
//! Shorthand constructors for the responses handlers return most often.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use zenith_schema::ValidationFailure;

use crate::error::{AppError, ErrorBody};

/// 200 with `data` as a JSON body.
pub fn json<T: Serialize>(data: &T) -> Response {
    json_with(data, StatusCode::OK, HeaderMap::new())
}

/// `data` as a JSON body with an explicit status and extra headers.
///
/// A value that fails to serialize produces a 500.
pub fn json_with<T: Serialize>(data: &T, status: StatusCode, headers: HeaderMap) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (status, headers, Json(value)).into_response(),
        Err(e) => AppError::internal(format!("response serialization failed: {e}")).into_response(),
    }
}

/// `{ "error": message }` with `status`.
pub fn error(message: impl Into<String>, status: StatusCode) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// The structured validation error body with the failure's status.
pub fn validation_error(failure: &ValidationFailure) -> Response {
    let status = StatusCode::from_u16(failure.status()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(failure.to_body())).into_response()
}

/// Redirect to `location` with `status`.
pub fn redirect(location: &str, status: StatusCode) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => AppError::internal(format!("invalid redirect location: {location:?}"))
            .into_response(),
    }
}

/// 302 redirect to `location`.
pub fn redirect_found(location: &str) -> Response {
    redirect(location, StatusCode::FOUND)
}
