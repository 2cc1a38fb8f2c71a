//! # Build Cache Routes
//!
//! `GET /api/build-cache/stats` and `POST /api/build-cache/prune`. Both
//! answer 404 when the server runs without a build cache.

use std::sync::Arc;

use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use serde_json::json;
use zenith_cache::BuildCache;

use crate::error::AppError;
use crate::response;
use crate::route::{RouteSchemas, ValidatedRequest};
use crate::routes::bind;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route(
            "/api/build-cache/stats",
            get(bind(state, RouteSchemas::new(), stats)),
        )
        .route(
            "/api/build-cache/prune",
            post(bind(state, RouteSchemas::new(), prune)),
        )
}

fn cache(state: &AppState) -> Result<&Arc<Mutex<BuildCache>>, AppError> {
    state
        .build_cache
        .as_ref()
        .ok_or_else(|| AppError::not_found("Build cache is disabled"))
}

/// Run `f` against the cache on the blocking pool; cache calls touch disk.
async fn with_cache<R, F>(state: &AppState, f: F) -> Result<R, AppError>
where
    F: FnOnce(&mut BuildCache) -> R + Send + 'static,
    R: Send + 'static,
{
    let cache = Arc::clone(cache(state)?);
    tokio::task::spawn_blocking(move || f(&mut *cache.lock()))
        .await
        .map_err(|e| AppError::internal(format!("build cache task failed: {e}")))
}

/// GET /api/build-cache/stats
async fn stats(state: AppState, _req: ValidatedRequest) -> Result<Response, AppError> {
    let stats = with_cache(&state, |cache| cache.stats()).await?;
    Ok(response::json(&stats))
}

/// POST /api/build-cache/prune — delete unreferenced artifacts.
async fn prune(state: AppState, _req: ValidatedRequest) -> Result<Response, AppError> {
    let removed = with_cache(&state, |cache| cache.prune()).await??;
    tracing::info!(removed, "build cache pruned via API");
    Ok(response::json(&json!({ "removed": removed })))
}
