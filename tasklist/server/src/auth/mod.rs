//! Identity handling for requests fronted by a hosting platform that injects
//! a base64-encoded JSON client principal header.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::web::api::ErrorResponse;

pub mod api;

/// Header carrying the encoded client principal.
pub const PRINCIPAL_HEADER: &str = "x-ms-client-principal";

/// Role granted to every identified user.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// Identity claims as injected by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPrincipal {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_details: Option<String>,
    #[serde(default)]
    pub identity_provider: Option<String>,
    #[serde(default)]
    pub user_roles: Vec<String>,
}

/// Represents the currently identified user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
    pub user_details: Option<String>,
    pub roles: Vec<String>,
}

/// Reasons a request could not be tied to a user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing x-ms-client-principal header")]
    MissingHeader,
    #[error("Client principal is not valid base64")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("Client principal is not valid JSON: {0}")]
    InvalidPrincipal(#[from] serde_json::Error),
    #[error("Client principal has no user ID")]
    MissingUserId,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!("Rejecting unauthenticated request: {}", self);
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHORIZED", "Unauthorized")),
        )
            .into_response()
    }
}

/// Decodes a raw principal header value.
pub fn decode_principal(encoded: &[u8]) -> Result<ClientPrincipal, AuthError> {
    let decoded = STANDARD.decode(encoded.trim_ascii())?;
    let principal = serde_json::from_slice(&decoded)?;
    Ok(principal)
}

/// Roles granted to a principal. Every identified user gets
/// [`AUTHENTICATED_ROLE`].
pub fn resolve_roles(_principal: &ClientPrincipal) -> Vec<String> {
    vec![AUTHENTICATED_ROLE.to_string()]
}

/// Identifies the user behind a request from its principal header.
pub fn authenticate(headers: &HeaderMap) -> Result<CurrentUser, AuthError> {
    let header = headers
        .get(PRINCIPAL_HEADER)
        .ok_or(AuthError::MissingHeader)?;
    let principal = decode_principal(header.as_bytes())?;

    let user_id = match principal.user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(AuthError::MissingUserId),
    };
    let roles = resolve_roles(&principal);

    Ok(CurrentUser {
        user_id,
        user_details: principal.user_details,
        roles,
    })
}
