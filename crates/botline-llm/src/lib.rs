//! Language-model integration for Botline.
//!
//! [`CompletionProvider`] is the seam the relay depends on; [`OpenAiProvider`]
//! is the production implementation, [`mock::MockProvider`] the test double.

#![forbid(unsafe_code)]

pub mod error;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;

pub use error::{Error, Result};
pub use message::{ChatMessage, ChatRole};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{Completion, CompletionProvider, CompletionRequest, DEFAULT_TEMPERATURE};
