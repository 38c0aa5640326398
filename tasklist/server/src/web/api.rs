use std::sync::Arc;
use std::time::Duration;

use crate::{auth, task::api::v1::TaskState};

use axum::{
    Router,
    http::{HeaderValue, header},
    middleware::from_fn,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowMethods, AllowOrigin, CorsLayer};

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

/// JSON response for API errors.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// CORS rules for one route: the configured origin on every response, and
/// preflight answers listing `methods`.
pub fn cors_layer(origin: &HeaderValue, methods: impl Into<AllowMethods>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin.clone()))
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE)
}

/// Creates the API routes for JSON API endpoints, nested under `/api`.
///
/// With `require_auth`, task routes answer 401 to requests without a valid
/// client principal. Role resolution is always public.
pub fn create_api_router(
    task_state: Arc<TaskState>,
    origin: &HeaderValue,
    require_auth: bool,
) -> Router {
    let roles_router = auth::api::v1::create_api_router(origin);
    let tasks_router = crate::task::api::v1::create_api_router(task_state, origin, require_auth);
    let api_routes = roles_router.merge(tasks_router);
    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::auth_user_middleware)))
}
