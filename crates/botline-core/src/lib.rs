//! Botline core — domain types, SQLite persistence, and server configuration.
//!
//! The relay and the HTTP API both sit on top of this crate: bots and their
//! conversation history live here, external services (gateway, LLM) live in
//! sibling crates.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use store::BotStore;
pub use types::{Bot, BotUpdate, NewBot, Sender, StoredMessage};
