//! Error types for botline-core.

use thiserror::Error;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bot already claims this WhatsApp number
    #[error("whatsapp number already in use: {0}")]
    DuplicateNumber(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// General internal error
    #[error("{0}")]
    Internal(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
