use crate::auth::{AuthError, CurrentUser, authenticate};
use crate::web::api::{ErrorResponse, cors_layer};
use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

/// JSON response listing the roles of the calling user.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolesResponse {
    pub roles: Vec<String>,
}

/// Creates a JSON API router for role resolution, open to `origin`.
pub fn create_api_router(origin: &HeaderValue) -> Router {
    Router::new().route(
        "/roles",
        get(roles_handler)
            .post(roles_handler)
            .layer(cors_layer(origin, [Method::GET, Method::POST, Method::OPTIONS])),
    )
}

/// Handler for GET/POST /api/roles.
/// Resolves the caller's roles from the client principal header.
#[tracing::instrument(skip(headers))]
pub async fn roles_handler(headers: HeaderMap) -> Result<Json<RolesResponse>, AuthError> {
    let user = authenticate(&headers)?;
    tracing::info!("Assigned roles {:?} to user {}", user.roles, user.user_id);
    Ok(Json(RolesResponse { roles: user.roles }))
}

/// Middleware that sets the CurrentUser extension when the request carries a
/// valid client principal. Never rejects.
pub async fn auth_user_middleware(mut request: Request, next: Next) -> Response {
    if let Ok(current_user) = authenticate(request.headers()) {
        request.extensions_mut().insert(current_user);
    }

    next.run(request).await
}

/// Middleware that ensures the current user is identified.
/// Returns UNAUTHORIZED if the CurrentUser extension is not found in the request.
/// Apply after auth_user_middleware and inside the CORS layer.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        let error_response = ErrorResponse::new(
            "UNAUTHORIZED",
            "Authentication required to access this resource",
        );
        return (StatusCode::UNAUTHORIZED, Json(error_response)).into_response();
    }

    next.run(request).await
}
