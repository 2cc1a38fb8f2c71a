//! # API Route Modules
//!
//! - `users` — demo resource: create, list, fetch, patch and delete users,
//!   every input declared as a schema.
//! - `pages` — ISR-served pages and on-demand revalidation.
//! - `rooms` — realtime room broadcast and presence over HTTP.
//! - `build_cache` — build cache statistics and pruning.
//!
//! Handlers are bound to the shared [`AppState`] with [`bind`], which also
//! applies the configured body limit.

pub mod build_cache;
pub mod pages;
pub mod rooms;
pub mod users;

use std::future::Future;

use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;

use crate::error::AppError;
use crate::route::{into_handler, RouteSchemas, TypedRoute, ValidatedRequest};
use crate::state::AppState;

/// Bind a stateful handler to its schemas as an axum handler.
pub(crate) fn bind<H, Fut>(
    state: &AppState,
    schemas: RouteSchemas,
    handler: H,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    H: Fn(AppState, ValidatedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    let shared = state.clone();
    let route = TypedRoute::new(schemas, move |req: ValidatedRequest| {
        handler(shared.clone(), req)
    })
    .with_body_limit(state.config.body_limit);
    into_handler(route)
}
