//! # zenith-api — Typed Routes on Axum
//!
//! HTTP layer for Zenith. The core is [`route::typed_route`]: declare
//! schemas for a route's body, query and path parameters, and the handler
//! only ever sees input that passed them. Failures never reach the handler;
//! they become a 400 with a field-addressable body:
//!
//! ```json
//! { "error": "Validation Error",
//!   "details": [{ "path": "name", "message": "...", "received": "string" }] }
//! ```
//!
//! ## Routes
//!
//! - `/api/users*` — user resource with declared schemas.
//! - `/pages/{slug}`, `/api/revalidate` — ISR-served pages.
//! - `/api/rooms*` — realtime broadcast and presence.
//! - `/api/build-cache/*` — build cache maintenance.
//! - `/health/*` — liveness and readiness probes.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG, above `zenith-schema`,
//!   `zenith-realtime` and `zenith-cache`.
//! - All errors map to structured HTTP responses via [`AppError`].
//! - No global state: everything is reachable from the [`AppState`] passed
//!   to [`app`].

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod route;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use route::{typed_route, RouteSchemas, TypedRoute, ValidatedData, ValidatedRequest};
pub use state::{AppConfig, AppState};

use axum::routing::get;
use axum::Router;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::users::router(&state))
        .merge(routes::pages::router(&state))
        .merge(routes::rooms::router(&state))
        .merge(routes::build_cache::router(&state));

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .fallback(not_found)
        .layer(middleware::trace::layer())
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}

async fn not_found() -> AppError {
    AppError::not_found("Not Found")
}
