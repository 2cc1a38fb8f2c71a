//! # User Routes
//!
//! | Method | Path                | Validated                      |
//! |--------|---------------------|--------------------------------|
//! | POST   | `/api/users`        | body: [`create_user_schema`]   |
//! | GET    | `/api/users`        | query: [`list_users_query`]    |
//! | GET    | `/api/users/{id}`   | params: [`user_id_params`]     |
//! | PATCH  | `/api/users/{id}`   | params + body: [`update_user_schema`] |
//! | DELETE | `/api/users/{id}`   | params                         |

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zenith_schema::prelude::*;

use crate::error::AppError;
use crate::response;
use crate::route::{RouteSchemas, ValidatedRequest};
use crate::routes::bind;
use crate::state::{AppState, Role, User};

// -- Schemas ------------------------------------------------------------------

/// Body of `POST /api/users`.
pub fn create_user_schema() -> ObjectSchema {
    f::object()
        .field("name", f::string().trim().min(2).max(50))
        .field(
            "email",
            f::string()
                .trim()
                .to_lowercase()
                .email()
                .message("Please provide a valid email"),
        )
        .field("age", f::number().int().positive().max(150.0).optional())
        .field(
            "role",
            f::enumeration(["admin", "user"])
                .optional()
                .default_value("user"),
        )
}

/// Body of `PATCH /api/users/{id}`: name, age and active flag, all optional,
/// nothing else accepted.
pub fn update_user_schema() -> ObjectSchema {
    create_user_schema()
        .pick(&["name", "age"])
        .extend(&f::object().field("active", f::boolean()))
        .partial()
        .strict()
}

/// Largest accepted `page`. Keeps every accepted page inside `u64`.
pub const MAX_PAGE: f64 = 1_000_000.0;

/// Query of `GET /api/users`.
pub fn list_users_query() -> ObjectSchema {
    f::object()
        .field(
            "page",
            f::number()
                .int()
                .min(1.0)
                .max(MAX_PAGE)
                .optional()
                .default_value(1),
        )
        .field(
            "limit",
            f::number()
                .int()
                .min(1.0)
                .max(100.0)
                .optional()
                .default_value(20),
        )
        .field("active", f::boolean().optional())
}

/// Path parameters of `/api/users/{id}`.
pub fn user_id_params() -> ObjectSchema {
    f::object().field("id", f::string().uuid().message("Invalid user id"))
}

// -- Typed inputs -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreateUser {
    name: String,
    email: String,
    age: Option<u64>,
    role: Role,
}

#[derive(Debug, Deserialize)]
struct UpdateUser {
    name: Option<String>,
    age: Option<u64>,
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: u64,
    limit: u64,
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct UserPath {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct UserPage {
    data: Vec<User>,
    page: u64,
    limit: u64,
    total: usize,
}

// -- Router -------------------------------------------------------------------

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route(
            "/api/users",
            get(bind(
                state,
                RouteSchemas::new().query(list_users_query()),
                list_users,
            ))
            .post(bind(
                state,
                RouteSchemas::new().body(create_user_schema()),
                create_user,
            )),
        )
        .route(
            "/api/users/{id}",
            get(bind(
                state,
                RouteSchemas::new().params(user_id_params()),
                get_user,
            ))
            .patch(bind(
                state,
                RouteSchemas::new()
                    .params(user_id_params())
                    .body(update_user_schema()),
                update_user,
            ))
            .delete(bind(
                state,
                RouteSchemas::new().params(user_id_params()),
                delete_user,
            )),
        )
}

// -- Handlers -----------------------------------------------------------------

/// POST /api/users — register a user. Emails are unique.
async fn create_user(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let input: CreateUser = req.body()?;
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
        age: input.age,
        role: input.role,
        active: true,
        created_at: Utc::now(),
    };

    let email = user.email.clone();
    if !state
        .users
        .insert_unless(user.id, user.clone(), |u| u.email == email)
    {
        return Err(AppError::Conflict(format!(
            "A user with email {email} already exists"
        )));
    }
    tracing::info!(user_id = %user.id, "user created");

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/api/users/{}", user.id))
        .map_err(|e| AppError::internal(format!("location header: {e}")))?;
    headers.insert(header::LOCATION, location);
    Ok(response::json_with(&user, StatusCode::CREATED, headers))
}

/// GET /api/users — list users, oldest first, paginated.
async fn list_users(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let query: ListQuery = req.query()?;

    let mut users: Vec<User> = state
        .users
        .list()
        .into_iter()
        .filter(|u| query.active.map_or(true, |active| u.active == active))
        .collect();
    users.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let total = users.len();
    let skip = query.page.saturating_sub(1).saturating_mul(query.limit);
    let data = users
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
        .collect();

    Ok(response::json(&UserPage {
        data,
        page: query.page,
        limit: query.limit,
        total,
    }))
}

/// GET /api/users/{id}
async fn get_user(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let path: UserPath = req.params()?;
    let user = state
        .users
        .get(&path.id)
        .ok_or_else(|| AppError::not_found(format!("User {} not found", path.id)))?;
    Ok(response::json(&user))
}

/// PATCH /api/users/{id}
async fn update_user(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let path: UserPath = req.params()?;
    let changes: UpdateUser = req.body()?;
    let user = state
        .users
        .update(&path.id, |user| {
            if let Some(name) = changes.name {
                user.name = name;
            }
            if changes.age.is_some() {
                user.age = changes.age;
            }
            if let Some(active) = changes.active {
                user.active = active;
            }
        })
        .ok_or_else(|| AppError::not_found(format!("User {} not found", path.id)))?;
    Ok(response::json(&user))
}

/// DELETE /api/users/{id}
async fn delete_user(state: AppState, req: ValidatedRequest) -> Result<Response, AppError> {
    let path: UserPath = req.params()?;
    state
        .users
        .remove(&path.id)
        .ok_or_else(|| AppError::not_found(format!("User {} not found", path.id)))?;
    tracing::info!(user_id = %path.id, "user deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
