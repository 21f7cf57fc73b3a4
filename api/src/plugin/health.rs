//! Instance health check.

use super::Datasource;
use serde::{Deserialize, Serialize};
use shared::client::MiradorClient;
use shared::config::{InstanceSettings, PluginSettings};
use tokio_util::sync::CancellationToken;

/// Outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The upstream answered the probe.
    Ok,
    /// The configuration is unusable or the probe failed.
    Error,
}

/// Status and message shown on the datasource configuration page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckHealthResult {
    /// Outcome.
    pub status: HealthStatus,
    /// Human readable message.
    pub message: String,
}

impl CheckHealthResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
        }
    }
}

impl Datasource {
    /// Checks that the instance is configured and the upstream is reachable.
    pub async fn check_health(
        &self,
        settings: Option<&InstanceSettings>,
        token: &CancellationToken,
    ) -> CheckHealthResult {
        let Some(Ok(settings)) = settings.map(PluginSettings::load) else {
            return CheckHealthResult::error("Unable to load settings");
        };

        if !settings.has_url() {
            return CheckHealthResult::error("Mirador API URL is missing");
        }

        let client = match MiradorClient::new(&settings.client_config()) {
            Ok(client) => client,
            Err(e) => return CheckHealthResult::error(e.to_string()),
        };

        match client.health(token).await {
            Ok(()) => CheckHealthResult::ok("Mirador Core configuration looks good"),
            Err(e) => {
                tracing::warn!(url = %settings.url, error = %e, "Health check failed");
                CheckHealthResult::error(e.to_string())
            }
        }
    }
}
