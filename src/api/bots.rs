//! Bot management API endpoints
//!
//! GET    /api/v1/bots - List the caller's bots
//! POST   /api/v1/bots - Create a bot
//! GET    /api/v1/bots/:id - Get bot details
//! PUT    /api/v1/bots/:id - Update a bot
//! DELETE /api/v1/bots/:id - Delete a bot and its history
//! GET    /api/v1/bots/:id/messages - Recent conversation, chronological
//! GET    /api/v1/bots/:id/whatsapp/state - Gateway instance state
//! GET    /api/v1/bots/:id/whatsapp/qr - QR code for linking
//! POST   /api/v1/bots/:id/whatsapp/logout - Unlink the instance

use super::ApiError;
use crate::middleware::auth::RequireAuth;
use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use botline_core::{Bot, BotStore, BotUpdate, NewBot, StoredMessage};
use botline_gateway::{GreenApi, InstanceCredentials, QrResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Default page size for conversation history
const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Request to create a bot
#[derive(Debug, Deserialize)]
pub struct CreateBotRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub whatsapp_number: String,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub api_token: String,
}

impl CreateBotRequest {
    fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("name", &self.name),
            ("system_prompt", &self.system_prompt),
            ("whatsapp_number", &self.whatsapp_number),
            ("instance_id", &self.instance_id),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::missing_field(field));
            }
        }
        Ok(())
    }
}

/// History query parameters
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<u32>,
}

/// Gateway state response
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub status: String,
}

/// QR code response
#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

async fn list_bots(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
) -> Result<Json<Vec<Bot>>, ApiError> {
    let bots = store.list_bots(&principal.subject).await?;
    Ok(Json(bots))
}

async fn create_bot(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Json(request): Json<CreateBotRequest>,
) -> Result<(StatusCode, Json<Bot>), ApiError> {
    request.validate()?;

    let bot = store
        .create_bot(NewBot {
            owner: principal.subject,
            name: request.name,
            system_prompt: request.system_prompt,
            language: request.language.unwrap_or_else(|| "en".to_string()),
            whatsapp_number: request.whatsapp_number,
            instance_id: request.instance_id,
            api_token: request.api_token,
        })
        .await?;

    info!(bot = %bot.id, number = %bot.whatsapp_number, "bot created");
    Ok((StatusCode::CREATED, Json(bot)))
}

/// Fetch a bot the caller owns. Missing bots and other owners' bots both
/// come back 404 so the route does not leak which ids exist.
async fn owned_bot(store: &BotStore, id: &str, subject: &str) -> Result<Bot, ApiError> {
    let bot = store
        .get_bot(id)
        .await?
        .filter(|bot| bot.owner == subject)
        .ok_or_else(|| ApiError::not_found("bot"))?;
    Ok(bot)
}

async fn get_bot(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Path(id): Path<String>,
) -> Result<Json<Bot>, ApiError> {
    let bot = owned_bot(&store, &id, &principal.subject).await?;
    Ok(Json(bot))
}

async fn update_bot(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Path(id): Path<String>,
    Json(update): Json<BotUpdate>,
) -> Result<Json<Bot>, ApiError> {
    owned_bot(&store, &id, &principal.subject).await?;
    let bot = store
        .update_bot(&id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("bot"))?;
    info!(bot = %bot.id, "bot updated");
    Ok(Json(bot))
}

async fn delete_bot(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    owned_bot(&store, &id, &principal.subject).await?;
    if store.delete_bot(&id).await? {
        info!(bot = %id, "bot deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("bot"))
    }
}

async fn bot_messages(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<StoredMessage>>, ApiError> {
    owned_bot(&store, &id, &principal.subject).await?;

    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    let messages = store.recent_messages(&id, limit).await?;
    Ok(Json(messages))
}

/// Resolve a caller-owned bot and its gateway credentials, 400 when
/// unconnected.
async fn credentials_for(
    store: &BotStore,
    id: &str,
    subject: &str,
) -> Result<InstanceCredentials, ApiError> {
    let bot = owned_bot(store, id, subject).await?;

    if !bot.has_credentials() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "bot has no gateway credentials",
        ));
    }
    Ok(InstanceCredentials::new(
        bot.instance_id.as_str(),
        bot.api_token.as_str(),
    ))
}

async fn whatsapp_state(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Extension(gateway): Extension<Arc<GreenApi>>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let credentials = credentials_for(&store, &id, &principal.subject).await?;
    let state = gateway.get_state(&credentials).await?;
    Ok(Json(StateResponse {
        status: state.as_raw().to_string(),
    }))
}

async fn whatsapp_qr(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Extension(gateway): Extension<Arc<GreenApi>>,
    Path(id): Path<String>,
) -> Result<Json<QrCodeResponse>, ApiError> {
    let credentials = credentials_for(&store, &id, &principal.subject).await?;
    let response = match gateway.qr(&credentials).await? {
        QrResult::Connected => QrCodeResponse {
            status: "connected",
            qr_code: None,
        },
        QrResult::AwaitingScan { qr } => QrCodeResponse {
            status: "awaiting_scan",
            qr_code: Some(qr),
        },
    };
    Ok(Json(response))
}

async fn whatsapp_logout(
    RequireAuth(principal): RequireAuth,
    Extension(store): Extension<BotStore>,
    Extension(gateway): Extension<Arc<GreenApi>>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let credentials = credentials_for(&store, &id, &principal.subject).await?;
    gateway.logout(&credentials).await?;
    Ok(Json(StateResponse {
        status: "disconnected".to_string(),
    }))
}

/// Create bot management routes
pub fn bots_routes() -> Router {
    Router::new()
        .route("/api/v1/bots", get(list_bots).post(create_bot))
        .route(
            "/api/v1/bots/:id",
            get(get_bot).put(update_bot).delete(delete_bot),
        )
        .route("/api/v1/bots/:id/messages", get(bot_messages))
        .route("/api/v1/bots/:id/whatsapp/state", get(whatsapp_state))
        .route("/api/v1/bots/:id/whatsapp/qr", get(whatsapp_qr))
        .route(
            "/api/v1/bots/:id/whatsapp/logout",
            axum::routing::post(whatsapp_logout),
        )
}
