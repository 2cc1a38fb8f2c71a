//! # Raw Input Extraction
//!
//! Pulls the three validated input categories out of an HTTP request in
//! their raw, unvalidated form:
//!
//! - **Body:** bytes read up to a size limit, then decoded as JSON.
//! - **Query:** URL search parameters flattened to `{ name: "value" }`.
//!   Every value is a string; when a name repeats, the last value wins.
//! - **Params:** path parameters captured by the matched route.

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Read `body` and decode it as JSON.
///
/// Any read or decode failure (including an empty body) is
/// [`AppError::InvalidJson`], kept distinct from schema failures.
pub async fn read_json_body(body: Body, limit: usize) -> Result<Value, AppError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| AppError::InvalidJson(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::InvalidJson(e.to_string()))
}

/// Flatten a raw query string into a JSON object of strings.
pub fn query_object(query: Option<&str>) -> Value {
    let mut out = Map::new();
    if let Some(query) = query {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            out.insert(name.into_owned(), Value::String(value.into_owned()));
        }
    }
    Value::Object(out)
}

/// Path parameters of the matched route as a JSON object of strings.
///
/// A route without parameters yields an empty object.
pub async fn path_params(parts: &mut Parts) -> Value {
    let mut out = Map::new();
    if let Ok(params) = RawPathParams::from_request_parts(parts, &()).await {
        for (name, value) in &params {
            out.insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(out)
}
