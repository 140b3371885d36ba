//! Inbound webhook payload types and the text-message extractor.
//!
//! Green API delivers many notification shapes (incoming messages, outgoing
//! status callbacks, instance state changes). The relay only acts on incoming
//! text messages; everything else extracts to `None` and is acknowledged
//! without further action.

use serde::Deserialize;

/// Notification type for an inbound message
const INCOMING_MESSAGE: &str = "incomingMessageReceived";

/// Message type for plain text
const TEXT_MESSAGE: &str = "textMessage";

/// Webhook notification envelope. Every field is optional so that payload
/// variety never turns into a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    #[serde(default)]
    pub type_webhook: String,
    pub instance_data: Option<InstanceData>,
    pub sender_data: Option<SenderData>,
    pub message_data: Option<MessageData>,
}

/// The receiving instance (the bot's own line).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceData {
    /// WhatsApp id of the receiving number, e.g. "15557654321@c.us"
    #[serde(default)]
    pub wid: String,
}

/// The sending party.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderData {
    /// Sender id, e.g. "15551234567@c.us"
    #[serde(default)]
    pub sender: String,
    /// Chat id (differs from sender in group chats)
    #[serde(default)]
    pub chat_id: String,
    /// Display name, when the gateway knows it
    pub sender_name: Option<String>,
}

/// Message content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    #[serde(default)]
    pub type_message: String,
    pub text_message_data: Option<TextMessageData>,
}

/// Text body of a text message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageData {
    #[serde(default)]
    pub text_message: String,
}

/// A validated inbound text message, addresses stripped of their network
/// suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    /// Phone number of the user who wrote, e.g. "15551234567"
    pub sender: String,
    /// The bot's own configured number (resolver key)
    pub receiver: String,
    /// Message body, guaranteed non-empty
    pub text: String,
}

/// Strip the `@c.us` / `@g.us` style suffix from a WhatsApp id.
fn strip_suffix(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

impl WebhookNotification {
    /// Extract the inbound text message, or `None` when this notification is
    /// not one (status callback, media message, empty text, missing fields).
    #[must_use]
    pub fn incoming_text(&self) -> Option<InboundText> {
        if self.type_webhook != INCOMING_MESSAGE {
            return None;
        }

        let message_data = self.message_data.as_ref()?;
        if message_data.type_message != TEXT_MESSAGE {
            return None;
        }
        let text = &message_data.text_message_data.as_ref()?.text_message;
        if text.is_empty() {
            return None;
        }

        let sender = strip_suffix(&self.sender_data.as_ref()?.sender);
        let receiver = strip_suffix(&self.instance_data.as_ref()?.wid);
        if sender.is_empty() || receiver.is_empty() {
            return None;
        }

        Some(InboundText {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            text: text.clone(),
        })
    }
}
