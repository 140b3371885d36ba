//! Error types for botline-gateway.

use thiserror::Error;

/// Gateway error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure reaching the gateway
    #[error("network error: {0}")]
    Network(String),

    /// The gateway answered with a non-success HTTP status
    #[error("gateway returned status {0}")]
    Status(u16),

    /// The gateway answered but the body was not what we expect
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    /// The gateway accepted the call but reported a send failure
    #[error("send rejected: {0}")]
    SendRejected(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
