//! Datasource instance settings.
//!
//! The host hands every request the instance's plain `jsonData` object and the
//! decrypted secure map. [`PluginSettings::load`] turns those into a typed record
//! that the upstream client is built from.

use crate::client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied when an instance leaves `timeoutMs` unset or zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Key of the bearer token inside the decrypted secure map.
const BEARER_TOKEN_KEY: &str = "bearerToken";

/// Raw instance settings as delivered by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    /// Plain (non-secret) instance options.
    #[serde(default)]
    pub json_data: serde_json::Value,

    /// Secret options, already decrypted by the host.
    #[serde(default)]
    pub decrypted_secure_json_data: HashMap<String, String>,
}

impl InstanceSettings {
    /// Creates instance settings from a plain options object.
    #[must_use]
    pub fn new(json_data: serde_json::Value) -> Self {
        Self {
            json_data,
            decrypted_secure_json_data: HashMap::new(),
        }
    }

    /// Adds a decrypted secret.
    #[must_use]
    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.decrypted_secure_json_data
            .insert(key.into(), value.into());
        self
    }
}

/// Errors raised while decoding instance settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The `jsonData` object did not match the expected shape.
    #[error("could not unmarshal PluginSettings json: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Secrets recognised by the connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretSettings {
    /// Token forwarded as `Authorization: Bearer <token>`.
    pub bearer_token: String,
}

/// Typed configuration of one datasource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    /// Base URL of the Mirador Core API.
    #[serde(default)]
    pub url: String,

    /// Tenant forwarded in `X-Mirador-Tenant`.
    #[serde(default)]
    pub tenant_id: String,

    /// Whether the UI should open a live websocket. Carried, not used by the backend.
    #[serde(default)]
    pub enable_web_socket: bool,

    /// Request timeout in milliseconds; 0 selects [`DEFAULT_TIMEOUT`].
    #[serde(default)]
    pub timeout_ms: u64,

    /// Websocket endpoint for the UI. Carried, not used by the backend.
    #[serde(default)]
    pub websocket_url: String,

    /// Decrypted secrets.
    #[serde(skip)]
    pub secrets: SecretSettings,
}

impl PluginSettings {
    /// Decodes the typed settings from raw instance settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidJson`] if `jsonData` is not an object of the
    /// expected shape (a missing or `null` object is an error too).
    pub fn load(source: &InstanceSettings) -> Result<Self, SettingsError> {
        let mut settings: Self = serde_json::from_value(source.json_data.clone())?;
        settings.secrets = SecretSettings {
            bearer_token: source
                .decrypted_secure_json_data
                .get(BEARER_TOKEN_KEY)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(settings)
    }

    /// Returns true if a base URL has been configured.
    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Returns the effective request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }

    /// Builds the upstream client configuration for these settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.url.clone(),
            bearer_token: self.secrets.bearer_token.clone(),
            tenant_id: self.tenant_id.clone(),
            timeout: self.timeout(),
        }
    }
}
