//! Webhook handler for the WhatsApp gateway.
//!
//! Response contract: `200 {"success": true}` for everything the relay
//! handled or deliberately ignored (non-text payloads, unclaimed numbers),
//! `500 {"error": ...}` only for downstream failures. Gateways retry on
//! non-2xx, so "nobody claims this message" must not look like an error.

use crate::relay::{MessageRelay, RelayOutcome};
use axum::body::Bytes;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Webhook acknowledgment body
#[derive(Debug, Serialize)]
struct WebhookAck {
    success: bool,
}

/// Handle a gateway webhook delivery (POST)
///
/// Body is taken as raw bytes: a payload that is not JSON at all is just
/// another shape we do not act on, acknowledged like any other ignored
/// notification.
async fn whatsapp_webhook(
    Extension(relay): Extension<Arc<MessageRelay>>,
    body: Bytes,
) -> impl IntoResponse {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(&body) else {
        debug!("webhook body is not JSON, acknowledging without action");
        return (StatusCode::OK, Json(WebhookAck { success: true })).into_response();
    };

    match relay.handle_webhook(payload).await {
        Ok(RelayOutcome::Ignored)
        | Ok(RelayOutcome::Unclaimed)
        | Ok(RelayOutcome::Replied { .. }) => {
            (StatusCode::OK, Json(WebhookAck { success: true })).into_response()
        }
        Err(e) => {
            error!(error = %e, "relay pass failed");
            crate::api::ApiError::internal().into_response()
        }
    }
}

/// Gateway reachability probe (GET)
async fn whatsapp_webhook_probe() -> Json<WebhookAck> {
    Json(WebhookAck { success: true })
}

/// Create webhook routes
pub fn webhooks_routes() -> Router {
    Router::new().route(
        "/api/v1/webhooks/whatsapp",
        get(whatsapp_webhook_probe).post(whatsapp_webhook),
    )
}
