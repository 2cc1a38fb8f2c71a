//! # Typed Routes
//!
//! Wraps a handler with declared body/query/params schemas. Every request
//! runs the same pipeline:
//!
//! ```text
//! START → BODY → QUERY → PARAMS → HANDLER → RESPONSE
//!           │       │        │        │
//!           └───────┴────────┴────────┴──→ ERROR RESPONSE
//! ```
//!
//! - Each stage runs only when its schema is declared.
//! - The first failing stage ends the request with a 400 and skips the
//!   remaining stages and the handler.
//! - A body that is not JSON fails with `Invalid JSON body` before its
//!   schema runs.
//! - The handler returns `Result<Response, AppError>`.
//!   `AppError::Validation` becomes the structured 400. Any other error, or
//!   a panic, becomes a generic 500 and is logged.
//!
//! ## Usage
//!
//! ```ignore
//! let route = typed_route(
//!     RouteSchemas::new().body(f::object().field("name", f::string())),
//!     |req: ValidatedRequest| async move {
//!         let name = req.data().body.as_ref().map(|b| b["name"].clone());
//!         Ok(response::json(&name))
//!     },
//! );
//! let app = Router::new().route("/users", post(route));
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use zenith_schema::{Parse, Schema};

use crate::error::AppError;
use crate::extractors;

/// Default request body limit: 2 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Input category a schema applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Body,
    Query,
    Params,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
        }
    }
}

/// Schemas declared for a route. Any subset may be set.
#[derive(Debug, Clone, Default)]
pub struct RouteSchemas {
    pub body: Option<Schema>,
    pub query: Option<Schema>,
    pub params: Option<Schema>,
}

impl RouteSchemas {
    /// No schemas declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the JSON body against `schema`.
    pub fn body(mut self, schema: impl Into<Schema>) -> Self {
        self.body = Some(schema.into());
        self
    }

    /// Validate the flattened query string against `schema`.
    pub fn query(mut self, schema: impl Into<Schema>) -> Self {
        self.query = Some(schema.into());
        self
    }

    /// Validate the path parameters against `schema`.
    pub fn params(mut self, schema: impl Into<Schema>) -> Self {
        self.params = Some(schema.into());
        self
    }
}

/// Validated inputs. A field is `None` when its schema was not declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedData {
    pub body: Option<Value>,
    pub query: Option<Value>,
    pub params: Option<Value>,
}

/// A request whose declared inputs have passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    data: ValidatedData,
}

impl ValidatedRequest {
    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// All request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The validated inputs.
    pub fn data(&self) -> &ValidatedData {
        &self.data
    }

    /// Deserialize the validated body.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        typed(self.data.body.as_ref(), Stage::Body)
    }

    /// Deserialize the validated query.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        typed(self.data.query.as_ref(), Stage::Query)
    }

    /// Deserialize the validated path parameters.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        typed(self.data.params.as_ref(), Stage::Params)
    }
}

fn typed<T: DeserializeOwned>(value: Option<&Value>, stage: Stage) -> Result<T, AppError> {
    let value = value.ok_or_else(|| {
        AppError::internal(format!("no {} schema declared for this route", stage.as_str()))
    })?;
    T::deserialize(value).map_err(|e| {
        AppError::internal(format!(
            "validated {} does not match handler type: {e}",
            stage.as_str()
        ))
    })
}

/// Run one stage's schema, tagging the rejection in the log.
fn validate_stage(stage: Stage, schema: &Schema, raw: &Value) -> Result<Value, AppError> {
    schema.parse(raw).map_err(|failure| {
        tracing::debug!(stage = stage.as_str(), error = %failure, "request input rejected");
        AppError::Validation(failure)
    })
}

/// A handler bound to its declared schemas.
pub struct TypedRoute<H> {
    schemas: RouteSchemas,
    handler: H,
    body_limit: usize,
}

impl<H, Fut> TypedRoute<H>
where
    H: Fn(ValidatedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    /// Bind `handler` to `schemas` with the default body limit.
    pub fn new(schemas: RouteSchemas, handler: H) -> Self {
        Self {
            schemas,
            handler,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the body size limit in bytes.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Run the pipeline and always produce a response.
    pub async fn handle(&self, request: Request) -> Response {
        match self.run(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    async fn run(&self, request: Request) -> Result<Response, AppError> {
        let (mut parts, body) = request.into_parts();

        let body = match &self.schemas.body {
            Some(schema) => {
                let raw = extractors::read_json_body(body, self.body_limit).await?;
                Some(validate_stage(Stage::Body, schema, &raw)?)
            }
            None => None,
        };

        let query = match &self.schemas.query {
            Some(schema) => {
                let raw = extractors::query_object(parts.uri.query());
                Some(validate_stage(Stage::Query, schema, &raw)?)
            }
            None => None,
        };

        let params = match &self.schemas.params {
            Some(schema) => {
                let raw = extractors::path_params(&mut parts).await;
                Some(validate_stage(Stage::Params, schema, &raw)?)
            }
            None => None,
        };

        let request = ValidatedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            data: ValidatedData {
                body,
                query,
                params,
            },
        };

        // A handler may panic while building its future or while it is polled.
        let future = std::panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(request)))
            .map_err(|_| AppError::internal("handler panicked"))?;
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(AppError::internal("handler panicked")),
        }
    }
}

/// Bind `handler` to `schemas` and return a function usable as an axum
/// handler on any router.
pub fn typed_route<H, Fut>(
    schemas: RouteSchemas,
    handler: H,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    H: Fn(ValidatedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    into_handler(TypedRoute::new(schemas, handler))
}

/// Turn a configured [`TypedRoute`] into an axum handler.
pub fn into_handler<H, Fut>(
    route: TypedRoute<H>,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    H: Fn(ValidatedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    let route = Arc::new(route);
    move |request: Request| {
        let route = Arc::clone(&route);
        async move { route.handle(request).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zenith_schema::prelude::*;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn echo(req: ValidatedRequest) -> impl Future<Output = Result<Response, AppError>> {
        async move {
            let data = req.data();
            Ok(crate::response::json(&json!({
                "body": data.body,
                "query": data.query,
                "params": data.params,
            })))
        }
    }

    fn post(uri: &str, body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn body_is_validated_and_transformed() {
        let route = TypedRoute::new(
            RouteSchemas::new().body(f::object().field("name", f::string().trim())),
            echo,
        );
        let response = route.handle(post("/", r#"{"name":"  Ada "}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["body"], json!({ "name": "Ada" }));
    }

    #[tokio::test]
    async fn invalid_json_is_distinct_from_validation_failure() {
        let route = TypedRoute::new(
            RouteSchemas::new().body(f::object().field("name", f::string())),
            echo,
        );
        let response = route.handle(post("/", "{oops")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid JSON body" }));

        let response = route.handle(post("/", "{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Validation Error");
    }

    #[tokio::test]
    async fn body_is_not_read_without_schema() {
        let route = TypedRoute::new(RouteSchemas::new(), echo);
        let response = route.handle(post("/", "{not json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["body"], Value::Null);
    }

    #[tokio::test]
    async fn query_values_are_coerced_by_schema() {
        let route = TypedRoute::new(
            RouteSchemas::new().query(
                f::object()
                    .field("page", f::number().int().min(1.0))
                    .field("active", f::boolean().optional()),
            ),
            echo,
        );
        let request = Request::builder()
            .uri("/?page=3&active=false")
            .body(Body::empty())
            .unwrap();
        let response = route.handle(request).await;
        assert_eq!(
            body_json(response).await["query"],
            json!({ "page": 3, "active": false })
        );
    }

    #[tokio::test]
    async fn failing_stage_skips_later_stages_and_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let route = TypedRoute::new(
            RouteSchemas::new()
                .body(f::object().field("name", f::string()))
                .query(f::object().field("page", f::number())),
            move |_req: ValidatedRequest| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AppError>(crate::response::json(&json!({}))) }
            },
        );
        // Body is valid, query is not.
        let response = route.handle(post("/?page=abc", r#"{"name":"x"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["details"][0]["path"], "page");
        assert_eq!(body["details"][0]["received"], "string");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_validation_error_is_structured_400() {
        let route = TypedRoute::new(RouteSchemas::new(), |_req: ValidatedRequest| async {
            let parsed = f::number().parse(&json!("nope"))?;
            Ok::<_, AppError>(crate::response::json(&parsed))
        });
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = route.handle(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["details"][0]["path"], "root");
    }

    #[tokio::test]
    async fn handler_fault_is_generic_500() {
        let route = TypedRoute::new(RouteSchemas::new(), |_req: ValidatedRequest| async {
            Err::<Response, _>(AppError::from(anyhow::anyhow!("secret connection string")))
        });
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = route.handle(request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal Server Error" })
        );
    }

    #[tokio::test]
    async fn handler_panic_is_generic_500() {
        let route = TypedRoute::new(RouteSchemas::new(), |req: ValidatedRequest| async move {
            if req.header("x-explode").is_some() {
                panic!("handler bug");
            }
            Ok::<_, AppError>(crate::response::json(&json!({})))
        });
        let request = Request::builder()
            .uri("/")
            .header("x-explode", "1")
            .body(Body::empty())
            .unwrap();
        let response = route.handle(request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn handler_panic_before_future_is_generic_500() {
        let route = TypedRoute::new(RouteSchemas::new(), |req: ValidatedRequest| {
            if req.header("x-explode").is_some() {
                panic!("handler bug");
            }
            async move { Ok::<_, AppError>(crate::response::json(&json!({}))) }
        });
        let request = Request::builder()
            .uri("/")
            .header("x-explode", "1")
            .body(Body::empty())
            .unwrap();
        let response = route.handle(request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal Server Error" })
        );
    }

    #[tokio::test]
    async fn body_limit_is_enforced() {
        let route = TypedRoute::new(
            RouteSchemas::new().body(f::array(f::number())),
            echo,
        )
        .with_body_limit(8);
        let response = route.handle(post("/", "[1,2,3,4,5,6,7,8,9]")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid JSON body");
    }

    #[test]
    fn typed_accessors_deserialize() {
        #[derive(serde::Deserialize)]
        struct Params {
            id: String,
        }
        let req = ValidatedRequest {
            method: Method::GET,
            uri: Uri::from_static("/users/7"),
            headers: HeaderMap::new(),
            data: ValidatedData {
                params: Some(json!({ "id": "7" })),
                ..Default::default()
            },
        };
        let params: Params = req.params().unwrap();
        assert_eq!(params.id, "7");
        assert!(matches!(req.body::<Value>(), Err(AppError::Internal(_))));
    }
}
