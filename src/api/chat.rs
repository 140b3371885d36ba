//! Direct chat endpoint: talk to a bot without going through WhatsApp.
//!
//! Used by the dashboard's test-chat panel. Same history → completion →
//! persist path as the webhook relay, minus the gateway.

use super::ApiError;
use crate::middleware::auth::RequireAuth;
use crate::relay::{MessageRelay, RelayError};
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub bot_id: String,
    #[serde(default)]
    pub message: String,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

async fn chat(
    RequireAuth(_principal): RequireAuth,
    Extension(relay): Extension<Arc<MessageRelay>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.bot_id.trim().is_empty() {
        return Err(ApiError::missing_field("bot_id"));
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::missing_field("message"));
    }

    match relay.converse(&request.bot_id, &request.message).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(RelayError::BotNotFound(_)) => Err(ApiError::not_found("bot")),
        Err(e) => {
            error!(error = %e, "chat request failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to generate response",
            ))
        }
    }
}

/// Create chat routes
pub fn chat_routes() -> Router {
    Router::new().route("/api/v1/chat", post(chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_empty() {
        let request: ChatRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(request.bot_id.is_empty());
        assert!(request.message.is_empty());
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(ChatResponse {
            response: "Hi".to_string(),
        })
        .unwrap();
        assert_eq!(json["response"], "Hi");
    }
}
