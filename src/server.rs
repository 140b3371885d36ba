//! Server initialization: construct the store, provider, gateway, and relay,
//! wire them into the router, and serve.

use crate::api;
use crate::middleware::auth::ApiAuth;
use crate::relay::MessageRelay;
use anyhow::{Context, Result};
use axum::extract::Extension;
use botline_core::{BotStore, ServerConfig};
use botline_gateway::{Gateway, GreenApi};
use botline_llm::{CompletionProvider, OpenAiProvider};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build and run the HTTP server until shutdown.
pub async fn run(config: ServerConfig) -> Result<()> {
    let store = BotStore::from_path(&config.db_path)
        .await
        .context("Failed to open bot store")?;

    let provider: Arc<dyn CompletionProvider> =
        Arc::new(OpenAiProvider::from_env().context("Failed to configure completion provider")?);

    let gateway = Arc::new(GreenApi::new());

    let relay = Arc::new(MessageRelay::new(
        store.clone(),
        provider,
        gateway.clone() as Arc<dyn Gateway>,
    ));

    let auth = Arc::new(ApiAuth::new(config.api_token.clone()));
    if !auth.is_enabled() {
        info!("BOTLINE_API_TOKEN not set, dashboard API auth is disabled");
    }

    let app = api::api_router()
        .layer(Extension(store))
        .layer(Extension(relay))
        .layer(Extension(gateway))
        .layer(Extension(auth))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Botline listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
