//! Green API REST client.
//!
//! Endpoint shape is `{base}/waInstance{id}/{Method}/{token}`; the instance
//! id and token come from the bot record, not from process-wide
//! configuration, so both are passed per call.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Green API base URL
pub const GREENAPI_BASE_URL: &str = "https://api.green-api.com";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// WhatsApp network suffix appended to chat identifiers
const CHAT_SUFFIX: &str = "@c.us";

/// Mask a token for safe display
fn mask_token(token: &str) -> String {
    if token.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &token[..4], &token[token.len() - 4..])
}

/// Per-bot gateway credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct InstanceCredentials {
    /// Gateway instance identifier
    pub instance_id: String,
    /// Gateway instance token
    pub api_token: String,
}

// SECURITY: mask the token in debug output
impl fmt::Debug for InstanceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCredentials")
            .field("instance_id", &self.instance_id)
            .field("api_token", &mask_token(&self.api_token))
            .finish()
    }
}

impl InstanceCredentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(instance_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            api_token: api_token.into(),
        }
    }
}

/// Gateway instance connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    /// Linked to a WhatsApp account and ready
    Authorized,
    /// Not linked; needs a QR scan
    NotAuthorized,
    /// Instance is starting up
    Starting,
    /// Account blocked by WhatsApp
    Blocked,
    /// Any state we do not recognize (gateway adds new ones)
    Unknown(String),
}

impl InstanceState {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "authorized" => Self::Authorized,
            "notAuthorized" => Self::NotAuthorized,
            "starting" => Self::Starting,
            "blocked" => Self::Blocked,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The gateway's own name for this state.
    #[must_use]
    pub fn as_raw(&self) -> &str {
        match self {
            Self::Authorized => "authorized",
            Self::NotAuthorized => "notAuthorized",
            Self::Starting => "starting",
            Self::Blocked => "blocked",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Result of a QR code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrResult {
    /// Instance is already linked; nothing to scan
    Connected,
    /// Scan this base64-encoded QR image
    AwaitingScan { qr: String },
}

/// A queued notification fetched via polling.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Receipt to acknowledge with [`GreenApi::delete_notification`]
    pub receipt_id: i64,
    /// Raw webhook body
    pub body: serde_json::Value,
}

/// Sending side of the gateway, abstracted for dependency injection.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Send `text` to `destination` (a bare phone number, no suffix).
    /// Returns the gateway message id.
    async fn send_message(
        &self,
        credentials: &InstanceCredentials,
        destination: &str,
        text: &str,
    ) -> Result<String>;
}

/// Green API client. One shared HTTP client; credentials passed per call.
pub struct GreenApi {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    #[serde(rename = "chatId")]
    chat_id: String,
    message: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    #[serde(rename = "idMessage")]
    id_message: Option<String>,
}

#[derive(Deserialize)]
struct StateResponse {
    #[serde(rename = "stateInstance")]
    state_instance: String,
}

#[derive(Deserialize)]
struct QrResponse {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

#[derive(Deserialize)]
struct ReceiveNotificationResponse {
    #[serde(rename = "receiptId")]
    receipt_id: i64,
    body: serde_json::Value,
}

#[derive(Deserialize)]
struct DeleteNotificationResponse {
    result: bool,
}

impl Default for GreenApi {
    fn default() -> Self {
        Self::new()
    }
}

impl GreenApi {
    /// Create a client against the public Green API endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(GREENAPI_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn method_url(&self, credentials: &InstanceCredentials, method: &str) -> String {
        format!(
            "{}/waInstance{}/{}/{}",
            self.base_url, credentials.instance_id, method, credentials.api_token
        )
    }

    /// Current connection state of the instance.
    #[instrument(skip(self, credentials), fields(instance = %credentials.instance_id))]
    pub async fn get_state(&self, credentials: &InstanceCredentials) -> Result<InstanceState> {
        let url = self.method_url(credentials, "getStateInstance");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Status(resp.status().as_u16()));
        }

        let body: StateResponse = resp
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(InstanceState::from_raw(&body.state_instance))
    }

    /// QR code for linking the instance to a WhatsApp account.
    #[instrument(skip(self, credentials), fields(instance = %credentials.instance_id))]
    pub async fn qr(&self, credentials: &InstanceCredentials) -> Result<QrResult> {
        let url = self.method_url(credentials, "qr");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Status(resp.status().as_u16()));
        }

        let body: QrResponse = resp
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        if body.kind == "alreadyLogged" {
            Ok(QrResult::Connected)
        } else {
            Ok(QrResult::AwaitingScan { qr: body.message })
        }
    }

    /// Unlink the instance from its WhatsApp account.
    #[instrument(skip(self, credentials), fields(instance = %credentials.instance_id))]
    pub async fn logout(&self, credentials: &InstanceCredentials) -> Result<()> {
        let url = self.method_url(credentials, "logout");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Status(resp.status().as_u16()));
        }
        Ok(())
    }

    /// Pop the next queued notification, if any. Pair with
    /// [`Self::delete_notification`] to acknowledge.
    pub async fn receive_notification(
        &self,
        credentials: &InstanceCredentials,
    ) -> Result<Option<Notification>> {
        let url = self.method_url(credentials, "receiveNotification");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Status(resp.status().as_u16()));
        }

        // An empty queue comes back as a JSON null body
        let body: Option<ReceiveNotificationResponse> = resp
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(body.map(|n| Notification {
            receipt_id: n.receipt_id,
            body: n.body,
        }))
    }

    /// Acknowledge a polled notification.
    pub async fn delete_notification(
        &self,
        credentials: &InstanceCredentials,
        receipt_id: i64,
    ) -> Result<bool> {
        let url = format!(
            "{}/{}",
            self.method_url(credentials, "deleteNotification"),
            receipt_id
        );
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Status(resp.status().as_u16()));
        }

        let body: DeleteNotificationResponse = resp
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(body.result)
    }
}

#[async_trait::async_trait]
impl Gateway for GreenApi {
    async fn send_message(
        &self,
        credentials: &InstanceCredentials,
        destination: &str,
        text: &str,
    ) -> Result<String> {
        let url = self.method_url(credentials, "sendMessage");
        let request = SendMessageRequest {
            chat_id: format!("{destination}{CHAT_SUFFIX}"),
            message: text,
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "gateway rejected send");
            return Err(Error::Status(resp.status().as_u16()));
        }

        let body: SendMessageResponse = resp
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        match body.id_message {
            Some(id) => {
                debug!(message_id = %id, "message sent");
                Ok(id)
            }
            None => Err(Error::SendRejected(
                "response missing idMessage".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_shape() {
        let client = GreenApi::with_base_url("https://api.green-api.com");
        let creds = InstanceCredentials::new("1101000001", "abc123token");
        assert_eq!(
            client.method_url(&creds, "sendMessage"),
            "https://api.green-api.com/waInstance1101000001/sendMessage/abc123token"
        );
    }

    #[test]
    fn test_credentials_debug_masks_token() {
        let creds = InstanceCredentials::new("1101000001", "abc123token-secret");
        let dump = format!("{creds:?}");
        assert!(!dump.contains("abc123token-secret"));
        assert!(dump.contains("1101000001"));
    }

    #[test]
    fn test_instance_state_mapping() {
        assert_eq!(InstanceState::from_raw("authorized"), InstanceState::Authorized);
        assert_eq!(
            InstanceState::from_raw("notAuthorized"),
            InstanceState::NotAuthorized
        );
        assert_eq!(
            InstanceState::from_raw("yellowCard"),
            InstanceState::Unknown("yellowCard".to_string())
        );
    }

    #[test]
    fn test_send_request_serialization() {
        let request = SendMessageRequest {
            chat_id: "15551234567@c.us".to_string(),
            message: "Hello",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chatId"], "15551234567@c.us");
        assert_eq!(json["message"], "Hello");
    }
}
