//! Bridge server configuration module.
//!
//! Handles loading the listen address of the host bridge from environment
//! variables with sensible defaults. Instance settings are not read here; they
//! arrive with every request.

use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Bridge server configuration.
///
/// Configuration values can be set via environment variables:
/// - `MIRADOR_CONNECTOR_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `MIRADOR_CONNECTOR_PORT`: The port to listen on (default: 8080)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `MIRADOR_CONNECTOR_PORT` is set but cannot be parsed as a valid port number
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let host = lookup("MIRADOR_CONNECTOR_HOST").unwrap_or(defaults.host);

        let port = lookup("MIRADOR_CONNECTOR_PORT")
            .map(|p| p.parse::<u16>())
            .transpose()
            .context("MIRADOR_CONNECTOR_PORT must be a port number")?
            .unwrap_or(defaults.port);

        Ok(Self { host, port })
    }

    /// Returns the socket address for binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the host and port do not form a valid socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
