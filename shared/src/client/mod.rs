//! HTTP client for the Mirador Core API.
//!
//! Every operation takes a [`CancellationToken`]; cancelling it aborts the
//! in-flight exchange and the call fails with [`ClientError::Cancelled`].
//!
//! # Example
//!
//! ```no_run
//! use shared::client::{ClientConfig, MiradorClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), shared::client::ClientError> {
//! let client = MiradorClient::new(&ClientConfig::new("http://mirador.local"))?;
//! let schema = client.logs_schema(&CancellationToken::new()).await?;
//! println!("{} log fields", schema.fields.len());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::ClientError;

use crate::config::DEFAULT_TIMEOUT;
use crate::models::{
    LogsQuery, LogsResponse, LogsSchema, MetricDescriptor, MetricsQuery, MetricsResponse,
    MetricsSchema, SchemaField, TraceServiceSchema, TracesQuery, TracesResponse, TracesSchema,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "x-mirador-tenant";

const LOGS_QUERY_PATH: &str = "/api/v1/logs/query";
const METRICS_QUERY_PATH: &str = "/api/v1/query";
const TRACES_SEARCH_PATH: &str = "/api/v1/traces/search";
const LOGS_SCHEMA_PATH: &str = "/api/v1/schema/logs/fields";
const METRICS_SCHEMA_PATH: &str = "/api/v1/schema/metrics";
const TRACES_SCHEMA_PATH: &str = "/api/v1/schema/traces/services";
const HEALTH_PATH: &str = "/api/v1/health";

/// Runtime parameters of a [`MiradorClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Absolute base URL of the API.
    pub base_url: String,
    /// Bearer token; omitted from requests when empty.
    pub bearer_token: String,
    /// Tenant identifier; omitted from requests when empty.
    pub tenant_id: String,
    /// Per-request deadline; zero selects the 30 second default.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with only a base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = token.into();
        self
    }

    /// Sets the tenant identifier.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-over-HTTP client for one Mirador Core instance.
#[derive(Debug, Clone)]
pub struct MiradorClient {
    base_url: Url,
    http: reqwest::Client,
}

impl MiradorClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if:
    /// - the base URL is empty or not an absolute URL
    /// - the bearer token or tenant cannot be sent as a header value
    /// - the underlying HTTP client cannot be initialised
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let raw_url = config.base_url.trim();
        if raw_url.is_empty() {
            return Err(ClientError::Config("base url is required".to_string()));
        }

        let base_url = Url::parse(raw_url)
            .map_err(|e| ClientError::Config(format!("invalid base url: {e}")))?;

        let timeout = if config.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            config.timeout
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers(config)?)
            .build()
            .map_err(|e| ClientError::Config(format!("could not build http client: {e}")))?;

        Ok(Self { base_url, http })
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs a logs query.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, an error status, an undecodable
    /// body, or cancellation.
    pub async fn query_logs(
        &self,
        token: &CancellationToken,
        payload: &LogsQuery,
    ) -> Result<LogsResponse, ClientError> {
        self.post(token, LOGS_QUERY_PATH, payload).await
    }

    /// Runs a metrics query.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn query_metrics(
        &self,
        token: &CancellationToken,
        payload: &MetricsQuery,
    ) -> Result<MetricsResponse, ClientError> {
        self.post(token, METRICS_QUERY_PATH, payload).await
    }

    /// Runs a trace search.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn query_traces(
        &self,
        token: &CancellationToken,
        payload: &TracesQuery,
    ) -> Result<TracesResponse, ClientError> {
        self.post(token, TRACES_SEARCH_PATH, payload).await
    }

    /// Fetches the log field schema.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn logs_schema(&self, token: &CancellationToken) -> Result<LogsSchema, ClientError> {
        self.get(token, LOGS_SCHEMA_PATH).await
    }

    /// Fetches a single log field.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn log_field_schema(
        &self,
        token: &CancellationToken,
        name: &str,
    ) -> Result<SchemaField, ClientError> {
        self.get(token, &entity_path(LOGS_SCHEMA_PATH, name)).await
    }

    /// Fetches the metrics schema.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn metrics_schema(
        &self,
        token: &CancellationToken,
    ) -> Result<MetricsSchema, ClientError> {
        self.get(token, METRICS_SCHEMA_PATH).await
    }

    /// Fetches a single metric descriptor.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn metric_schema(
        &self,
        token: &CancellationToken,
        name: &str,
    ) -> Result<MetricDescriptor, ClientError> {
        self.get(token, &entity_path(METRICS_SCHEMA_PATH, name))
            .await
    }

    /// Fetches the traced services schema.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn traces_schema(
        &self,
        token: &CancellationToken,
    ) -> Result<TracesSchema, ClientError> {
        self.get(token, TRACES_SCHEMA_PATH).await
    }

    /// Fetches a single traced service.
    ///
    /// # Errors
    ///
    /// See [`MiradorClient::query_logs`].
    pub async fn trace_service_schema(
        &self,
        token: &CancellationToken,
        name: &str,
    ) -> Result<TraceServiceSchema, ClientError> {
        self.get(token, &entity_path(TRACES_SCHEMA_PATH, name))
            .await
    }

    /// Probes the upstream health endpoint. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Upstream`] with operation `health check` if the
    /// upstream answers with an error status, or a transport/cancellation error.
    pub async fn health(&self, token: &CancellationToken) -> Result<(), ClientError> {
        let url = self.endpoint(HEALTH_PATH)?;
        self.execute(token, "health check", self.http.get(url))
            .await?;
        Ok(())
    }

    async fn post<B, T>(&self, token: &CancellationToken, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let body = self.execute(token, "request", self.http.post(url).json(body)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T>(&self, token: &CancellationToken, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let body = self.execute(token, "request", self.http.get(url)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends a request and returns the body of a non-error response.
    async fn execute(
        &self,
        token: &CancellationToken,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ClientError> {
        if token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            if status.as_u16() >= 400 {
                return Err(ClientError::Upstream { operation, status });
            }
            let body = response.bytes().await?;
            Ok(body.to_vec())
        };

        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!(operation, "Mirador request cancelled");
                Err(ClientError::Cancelled)
            }
            result = exchange => result,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid request path {path}: {e}")))
    }
}

/// Builds `<collection>/<name>` with the name percent-encoded as one segment.
fn entity_path(collection: &str, name: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(name))
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if !config.bearer_token.is_empty() {
        let value = HeaderValue::from_str(&format!("Bearer {}", config.bearer_token))
            .map_err(|e| ClientError::Config(format!("invalid bearer token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    if !config.tenant_id.is_empty() {
        let value = HeaderValue::from_str(&config.tenant_id)
            .map_err(|e| ClientError::Config(format!("invalid tenant id: {e}")))?;
        headers.insert(HeaderName::from_static(TENANT_HEADER), value);
    }

    Ok(headers)
}
