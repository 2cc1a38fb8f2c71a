//! # Page Routes
//!
//! `GET /pages/{slug}` serves rendered HTML through the ISR page cache and
//! reports the cache outcome in the `x-cache` header (`HIT`, `STALE`,
//! `MISS`). `POST /api/revalidate` purges pages by path or tag.

use std::convert::Infallible;

use axum::http::{header, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use zenith_cache::Page;
use zenith_schema::prelude::*;

use crate::error::AppError;
use crate::response;
use crate::route::{RouteSchemas, ValidatedRequest};
use crate::routes::bind;
use crate::state::AppState;

/// Tag carried by every page rendered here.
pub const PAGES_TAG: &str = "pages";

/// Response header reporting the cache outcome.
pub const X_CACHE: &str = "x-cache";

fn is_slug(s: &str) -> bool {
    !s.starts_with('-')
        && !s.ends_with('-')
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Path parameters of `/pages/{slug}`.
pub fn page_params() -> ObjectSchema {
    f::object().field(
        "slug",
        f::string()
            .min(1)
            .max(64)
            .refine(is_slug, "Slug may contain only lowercase letters, digits and inner hyphens"),
    )
}

/// Body of `POST /api/revalidate`.
pub fn revalidate_schema() -> ObjectSchema {
    f::object()
        .field("path", f::string().starts_with("/").optional())
        .field("tag", f::string().min(1).optional())
        .strict()
}

#[derive(Debug, Deserialize)]
struct PagePath {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct Revalidate {
    path: Option<String>,
    tag: Option<String>,
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route(
            "/pages/{slug}",
            get(bind(
                state,
                RouteSchemas::new().params(page_params()),
                serve_page,
            )),
        )
        .route(
            "/api/revalidate",
            post(bind(
                state,
                RouteSchemas::new().body(revalidate_schema()),
                revalidate,
            )),
        )
}

/// Render the page for `slug`.
async fn render_page(slug: String) -> Result<Page, Infallible> {
    let title = slug.replace('-', " ");
    let body = format!(
        "<!doctype html><html><head><title>{title}</title></head>\
         <body><h1>{title}</h1><p>Generated at {}</p></body></html>",
        Utc::now().to_rfc3339()
    );
    Ok(Page::new(body)
        .tag(PAGES_TAG)
        .tag(format!("page:{slug}")))
}

/// GET /pages/{slug}
async fn serve_page(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let PagePath { slug } = req.params::<PagePath>()?;
    let key = format!("/pages/{slug}");
    let (page, status) = state
        .pages
        .get_or_render(&key, state.config.revalidate, move || render_page(slug))
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (HeaderName::from_static(X_CACHE), status.as_str()),
        ],
        page.body,
    )
        .into_response())
}

/// POST /api/revalidate — purge by `path`, `tag`, or both.
async fn revalidate(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let input: Revalidate = req.body()?;
    if input.path.is_none() && input.tag.is_none() {
        return Err(AppError::BadRequest(
            "Provide a path or a tag to revalidate".into(),
        ));
    }

    let mut purged = 0;
    if let Some(path) = &input.path {
        purged += usize::from(state.pages.revalidate_path(path));
    }
    if let Some(tag) = &input.tag {
        purged += state.pages.revalidate_tag(tag);
    }
    tracing::info!(path = ?input.path, tag = ?input.tag, purged, "pages revalidated");
    Ok(response::json(&json!({ "revalidated": purged })))
}
