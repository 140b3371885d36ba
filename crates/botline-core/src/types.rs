//! Domain types: bots and their conversation messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mask a credential for safe display
fn mask_token(token: &str) -> String {
    if token.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &token[..4], &token[token.len() - 4..])
}

/// A configured chatbot persona bound to one WhatsApp number.
///
/// Created and mutated through the dashboard API only; the relay holds a bot
/// for the duration of a single webhook pass and never writes it.
#[derive(Clone, Serialize)]
pub struct Bot {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning principal (e.g. an account email)
    pub owner: String,
    /// Display name
    pub name: String,
    /// System prompt sent as the first completion message
    pub system_prompt: String,
    /// Language tag (e.g. "en", "es")
    pub language: String,
    /// The WhatsApp number this bot answers on (unique across bots)
    pub whatsapp_number: String,
    /// Gateway instance identifier
    pub instance_id: String,
    /// Gateway instance token (opaque credential, never serialized)
    #[serde(skip_serializing)]
    pub api_token: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

// SECURITY: mask the gateway token in debug output
impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("language", &self.language)
            .field("whatsapp_number", &self.whatsapp_number)
            .field("instance_id", &self.instance_id)
            .field("api_token", &mask_token(&self.api_token))
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Bot {
    /// Whether this bot has a complete gateway credential pair.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.instance_id.is_empty() && !self.api_token.is_empty()
    }
}

/// Fields required to create a bot.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBot {
    pub owner: String,
    pub name: String,
    pub system_prompt: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub whatsapp_number: String,
    pub instance_id: String,
    #[serde(default)]
    pub api_token: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Partial update of a bot; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotUpdate {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub language: Option<String>,
    pub whatsapp_number: Option<String>,
    pub instance_id: Option<String>,
    pub api_token: Option<String>,
}

/// Which side of the conversation authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The WhatsApp user messaging the bot
    User,
    /// The bot's generated reply
    Bot,
}

impl Sender {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    /// Parse a stored sender tag; unknown tags default to `Bot`.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "user" => Self::User,
            _ => Self::Bot,
        }
    }
}

/// One entry in a bot's conversation history. Append-only from the relay.
#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning bot
    pub bot_id: String,
    /// Who authored the message
    pub sender: Sender,
    /// Text body
    pub body: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_roundtrip() {
        assert_eq!(Sender::parse("user"), Sender::User);
        assert_eq!(Sender::parse("bot"), Sender::Bot);
        assert_eq!(Sender::parse(Sender::User.as_str()), Sender::User);
    }

    #[test]
    fn test_bot_debug_masks_token() {
        let bot = Bot {
            id: "b1".to_string(),
            owner: "owner@example.com".to_string(),
            name: "Support".to_string(),
            system_prompt: "You are helpful.".to_string(),
            language: "en".to_string(),
            whatsapp_number: "15551234567".to_string(),
            instance_id: "1101000001".to_string(),
            api_token: "super-secret-gateway-token".to_string(),
            created_at: Utc::now(),
        };
        let dump = format!("{bot:?}");
        assert!(!dump.contains("super-secret-gateway-token"));
        assert!(dump.contains("supe...oken"));
    }

    #[test]
    fn test_bot_serialize_skips_token() {
        let bot = Bot {
            id: "b1".to_string(),
            owner: "owner@example.com".to_string(),
            name: "Support".to_string(),
            system_prompt: "You are helpful.".to_string(),
            language: "en".to_string(),
            whatsapp_number: "15551234567".to_string(),
            instance_id: "1101000001".to_string(),
            api_token: "super-secret-gateway-token".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&bot).unwrap();
        assert!(json.get("api_token").is_none());
        assert_eq!(json["whatsapp_number"], "15551234567");
    }

    #[test]
    fn test_has_credentials() {
        let mut bot = Bot {
            id: "b1".to_string(),
            owner: "o".to_string(),
            name: "n".to_string(),
            system_prompt: "p".to_string(),
            language: "en".to_string(),
            whatsapp_number: "1".to_string(),
            instance_id: "inst".to_string(),
            api_token: "tok".to_string(),
            created_at: Utc::now(),
        };
        assert!(bot.has_credentials());
        bot.api_token.clear();
        assert!(!bot.has_credentials());
    }
}
