//! Server configuration loaded from environment variables.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default HTTP port
const DEFAULT_PORT: u16 = 8080;

/// Default bind host
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default database file
const DEFAULT_DB_PATH: &str = "botline.db";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// SQLite database path
    pub db_path: PathBuf,
    /// Service API token for the dashboard API (None = auth disabled)
    pub api_token: Option<String>,
}

// SECURITY: never print the raw service token
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("api_token", &self.api_token.as_deref().map(|_| "***"))
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_token: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables.
    ///
    /// # Errors
    /// Returns an error if `BOTLINE_PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("BOTLINE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match std::env::var("BOTLINE_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid BOTLINE_PORT: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let db_path = std::env::var("BOTLINE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let api_token = std::env::var("BOTLINE_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            host,
            port,
            db_path,
            api_token,
        })
    }

    /// Set the port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Socket address string for binding
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
