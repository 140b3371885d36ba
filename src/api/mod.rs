//! Web API module for Botline
//!
//! Provides REST API endpoints for:
//! - The WhatsApp gateway webhook (the relay's entry point)
//! - Bot management (dashboard CRUD)
//! - Direct chat with a bot
//! - Health checks

pub mod bots;
pub mod chat;
pub mod health;
pub mod webhooks;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

pub use bots::bots_routes;
pub use chat::chat_routes;
pub use health::health_routes;
pub use webhooks::webhooks_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(health_routes())
        .merge(webhooks_routes())
        .merge(bots_routes())
        .merge(chat_routes())
}

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An API error with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with a field-level message
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            format!("missing required field: {field}"),
        )
    }

    /// 404
    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    /// 500 with the generic message the webhook contract promises
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<botline_core::Error> for ApiError {
    fn from(err: botline_core::Error) -> Self {
        match err {
            botline_core::Error::DuplicateNumber(number) => Self::new(
                StatusCode::CONFLICT,
                format!("whatsapp number already in use: {number}"),
            ),
            _ => {
                tracing::error!(error = %err, "store error");
                Self::internal()
            }
        }
    }
}

impl From<botline_gateway::Error> for ApiError {
    fn from(err: botline_gateway::Error) -> Self {
        tracing::error!(error = %err, "gateway error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "gateway request failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = ApiError::missing_field("whatsapp_number");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "missing required field: whatsapp_number");
    }

    #[test]
    fn test_duplicate_number_maps_to_conflict() {
        let err: ApiError = botline_core::Error::DuplicateNumber("123".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
