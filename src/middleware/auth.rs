//! Authentication for the dashboard API.
//!
//! Identity lives outside this service: an identity-aware proxy (or the
//! dashboard backend) authenticates the human and forwards the principal in
//! `X-Forwarded-User`, while the service itself is authenticated with a
//! shared token (`Authorization: Bearer` or `X-API-Key`). When no token is
//! configured, auth is disabled and requests run as an anonymous principal.
//! The WhatsApp webhook route never goes through this — the gateway cannot
//! send credentials.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Principal subject when auth is disabled or no user header is forwarded
const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Service auth configuration shared through an Extension layer.
#[derive(Clone)]
pub struct ApiAuth {
    token: Option<String>,
}

// SECURITY: never print the token itself
impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiAuth")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl ApiAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Whether a service token is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    fn matches(&self, presented: &str) -> bool {
        self.token.as_deref() == Some(presented)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthPrincipal {
    /// Owner identifier used to scope bot records (e.g. an account email)
    pub subject: String,
}

/// JSON error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    message: String,
}

impl AuthRejection {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(AuthErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Axum extractor that requires a valid service token.
///
/// Token sources, in order:
/// 1. `Authorization: Bearer <token>` header
/// 2. `X-API-Key: <key>` header
pub struct RequireAuth(pub AuthPrincipal);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth = parts.extensions.get::<Arc<ApiAuth>>().ok_or_else(|| {
            AuthRejection::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth configuration missing",
            )
        })?;

        if auth.is_enabled() {
            let token = extract_token(parts).ok_or_else(|| {
                AuthRejection::new(
                    StatusCode::UNAUTHORIZED,
                    "Authentication required. Provide Authorization: Bearer <token> or X-API-Key header.",
                )
            })?;

            if !auth.matches(&token) {
                return Err(AuthRejection::new(
                    StatusCode::UNAUTHORIZED,
                    "Invalid token or API key",
                ));
            }
        }

        let subject = parts
            .headers
            .get("x-forwarded-user")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_SUBJECT)
            .to_string();

        Ok(RequireAuth(AuthPrincipal { subject }))
    }
}

fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get("authorization") {
        if let Ok(raw) = value.to_str() {
            if let Some(token) = raw.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    parts
        .headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
