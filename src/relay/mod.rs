//! Inbound message relay: webhook payload in, WhatsApp reply out.
//!
//! One webhook delivery drives one sequential pass:
//! validate → resolve bot → load history → complete → persist → dispatch.
//! All collaborators are injected, so tests run the full pipeline against an
//! in-memory store and fakes.

use botline_core::{Bot, BotStore, Sender};
use botline_gateway::webhook::WebhookNotification;
use botline_gateway::{Gateway, InstanceCredentials};
use botline_llm::{ChatMessage, CompletionProvider, CompletionRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
mod tests;

/// How many prior messages to hand the model as context
pub const HISTORY_LIMIT: u32 = 10;

/// Maximum length of message text to log
const MAX_LOG_TEXT_LENGTH: usize = 50;

/// Truncate message text for logging
fn mask_for_logging(text: &str) -> String {
    if text.chars().count() > MAX_LOG_TEXT_LENGTH {
        let prefix: String = text.chars().take(MAX_LOG_TEXT_LENGTH).collect();
        format!("{prefix}...")
    } else {
        text.to_string()
    }
}

/// Relay error type.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Direct-chat caller named a bot that does not exist
    #[error("bot not found: {0}")]
    BotNotFound(String),

    /// The resolved bot has no gateway credential pair
    #[error("bot {0} has no gateway credentials")]
    MissingCredentials(String),

    /// Data store failure
    #[error(transparent)]
    Store(#[from] botline_core::Error),

    /// Completion provider failure
    #[error("completion failed: {0}")]
    Completion(#[from] botline_llm::Error),

    /// Gateway send failure
    #[error("gateway send failed: {0}")]
    Gateway(#[from] botline_gateway::Error),
}

/// What one webhook pass amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Not an incoming text message; acknowledged, nothing done
    Ignored,
    /// Text message, but no configured bot claims the receiving number
    Unclaimed,
    /// Reply generated, persisted, and dispatched
    Replied { bot_id: String },
}

/// The relay with its injected collaborators.
pub struct MessageRelay {
    store: BotStore,
    provider: Arc<dyn CompletionProvider>,
    gateway: Arc<dyn Gateway>,
}

impl MessageRelay {
    pub fn new(
        store: BotStore,
        provider: Arc<dyn CompletionProvider>,
        gateway: Arc<dyn Gateway>,
    ) -> Self {
        Self {
            store,
            provider,
            gateway,
        }
    }

    /// Run one full relay pass for a raw webhook payload.
    ///
    /// Non-text payloads and unclaimed numbers resolve to `Ok` outcomes so
    /// the webhook can answer 200 and the gateway stops redelivering; only
    /// downstream failures (store, provider, gateway send) are errors.
    #[instrument(skip(self, payload))]
    pub async fn handle_webhook(
        &self,
        payload: serde_json::Value,
    ) -> Result<RelayOutcome, RelayError> {
        let inbound = serde_json::from_value::<WebhookNotification>(payload)
            .ok()
            .and_then(|n| n.incoming_text());
        let Some(inbound) = inbound else {
            debug!("webhook is not an incoming text message, ignoring");
            return Ok(RelayOutcome::Ignored);
        };

        let Some(bot) = self.store.find_by_whatsapp_number(&inbound.receiver).await? else {
            warn!(number = %inbound.receiver, "no bot claims this number");
            return Ok(RelayOutcome::Unclaimed);
        };

        info!(
            bot = %bot.id,
            from = %inbound.sender,
            text = %mask_for_logging(&inbound.text),
            "relaying inbound message"
        );

        // Resolve credentials before spending a completion on a bot that
        // cannot deliver the reply anyway.
        let credentials = bot_credentials(&bot).ok_or_else(|| {
            error!(bot = %bot.id, "bot has no gateway credentials, cannot reply");
            RelayError::MissingCredentials(bot.id.clone())
        })?;

        let reply = self.respond(&bot, &inbound.text).await?;

        self.gateway
            .send_message(&credentials, &inbound.sender, &reply)
            .await?;

        Ok(RelayOutcome::Replied { bot_id: bot.id })
    }

    /// Direct-chat entry point: same history → completion → persist path as
    /// the webhook pass, minus validation and dispatch.
    pub async fn converse(&self, bot_id: &str, text: &str) -> Result<String, RelayError> {
        let bot = self
            .store
            .get_bot(bot_id)
            .await?
            .ok_or_else(|| RelayError::BotNotFound(bot_id.to_string()))?;
        self.respond(&bot, text).await
    }

    /// Generate a reply for `text` and persist both sides of the exchange.
    async fn respond(&self, bot: &Bot, text: &str) -> Result<String, RelayError> {
        let history = self.store.recent_messages(&bot.id, HISTORY_LIMIT).await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(bot.system_prompt.as_str()));
        for entry in &history {
            messages.push(match entry.sender {
                Sender::User => ChatMessage::user(entry.body.as_str()),
                Sender::Bot => ChatMessage::assistant(entry.body.as_str()),
            });
        }
        messages.push(ChatMessage::user(text));

        let completion = self
            .provider
            .complete(CompletionRequest::new(messages))
            .await?;

        // The reply exists now; a failed audit write must not keep the user
        // from receiving it. Inbound first, then outbound.
        if let Err(e) = self.store.append_message(&bot.id, Sender::User, text).await {
            error!(bot = %bot.id, error = %e, "failed to persist inbound message");
        }
        if let Err(e) = self
            .store
            .append_message(&bot.id, Sender::Bot, &completion.text)
            .await
        {
            error!(bot = %bot.id, error = %e, "failed to persist reply");
        }

        Ok(completion.text)
    }
}

/// The bot's gateway credential pair, when complete.
fn bot_credentials(bot: &Bot) -> Option<InstanceCredentials> {
    if !bot.has_credentials() {
        return None;
    }
    Some(InstanceCredentials::new(
        bot.instance_id.as_str(),
        bot.api_token.as_str(),
    ))
}
