//! The completion provider seam.

use crate::error::Result;
use crate::message::ChatMessage;

/// Default sampling temperature: some reply diversity without excessive
/// randomness.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A request for one chat completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Ordered role-tagged messages (system prompt first)
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Optional completion length cap
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request with the default temperature.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A generated completion.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Reply text
    pub text: String,
    /// Model that produced it
    pub model: String,
}

/// Turns a message list into a reply. Implementations must not retry
/// internally; callers own the failure policy.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Request a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}
