//! Schema resource plane.
//!
//! Resource paths have the shape `schema/<kind>[/<name>...]`:
//!
//! | Method     | Path                  | Action                                  |
//! |------------|-----------------------|-----------------------------------------|
//! | GET        | `schema/<kind>`       | cached upstream document plus overrides |
//! | GET        | `schema/<kind>/<name>`| override, else upstream entry           |
//! | POST / PUT | `schema/<kind>[/name]`| store an override, invalidate the cache |
//!
//! Every response body is JSON; failures are `{"error": "<message>"}`.

use super::Datasource;
use axum::http::StatusCode;
use serde::Serialize;
use shared::client::{ClientError, MiradorClient};
use shared::config::{InstanceSettings, PluginSettings, SettingsError};
use shared::models::{SchemaKind, SchemaValidationError};
use shared::schema::{CacheSlot, Registry, SchemaDocument, SchemaEntry};
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A resource call from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRequest {
    /// HTTP method; blank means GET.
    pub method: String,
    /// Slash-delimited resource path.
    pub path: String,
    /// Raw request body.
    pub body: Vec<u8>,
}

impl ResourceRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: Vec::new(),
        }
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// The answer to a resource call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceResponse {
    /// Response status.
    pub status: StatusCode,
    /// JSON body.
    pub body: serde_json::Value,
}

impl ResourceResponse {
    /// A 200 response carrying `payload`.
    #[must_use]
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self {
                status: StatusCode::OK,
                body,
            },
            Err(e) => Self::from(&ResourceError::Encode(e)),
        }
    }

    /// Returns the error message of a failed call.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(serde_json::Value::as_str)
    }
}

impl From<&ResourceError> for ResourceResponse {
    fn from(error: &ResourceError) -> Self {
        Self {
            status: error.status(),
            body: serde_json::json!({ "error": error.to_string() }),
        }
    }
}

/// Errors of the resource plane.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The request carried no instance settings.
    #[error("missing datasource settings")]
    MissingSettings,

    /// The instance settings could not be decoded.
    #[error("load settings: {0}")]
    Settings(#[from] SettingsError),

    /// The instance has no upstream URL.
    #[error("Mirador API URL is not configured")]
    MissingUrl,

    /// The method is not GET, POST or PUT.
    #[error("unsupported method")]
    MethodNotAllowed,

    /// The path does not name a schema resource.
    #[error("resource not found")]
    NotFound,

    /// A write had an empty body.
    #[error("request body is required")]
    EmptyBody,

    /// A write body was not a valid entry.
    #[error("invalid json payload: {0}")]
    InvalidPayload(serde_json::Error),

    /// The path name and the payload name differ.
    #[error("payload name must match resource path")]
    NameMismatch,

    /// The payload lacks required fields.
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    /// The upstream client failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The response could not be encoded.
    #[error("could not encode response: {0}")]
    Encode(serde_json::Error),
}

impl ResourceError {
    /// HTTP status reported for the error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSettings
            | Self::Settings(_)
            | Self::MissingUrl
            | Self::EmptyBody
            | Self::InvalidPayload(_)
            | Self::NameMismatch
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Client(e) if e.is_config() => StatusCode::BAD_REQUEST,
            Self::Client(_) => StatusCode::BAD_GATEWAY,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Read,
    Write,
}

impl Method {
    fn parse(raw: &str) -> Result<Self, ResourceError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "GET" => Ok(Self::Read),
            "POST" | "PUT" => Ok(Self::Write),
            _ => Err(ResourceError::MethodNotAllowed),
        }
    }
}

/// A parsed `schema/<kind>[/<name>]` path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SchemaPath {
    kind: SchemaKind,
    name: Option<String>,
}

impl SchemaPath {
    /// Parses a resource path. Name segments are re-joined with `/` and are not
    /// percent-decoded.
    fn parse(path: &str) -> Option<Self> {
        let path = path.trim().trim_matches('/');
        if path.is_empty() {
            return None;
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 2 || !segments[0].eq_ignore_ascii_case("schema") {
            return None;
        }

        let kind = SchemaKind::from_segment(segments[1])?;
        let rest = &segments[2..];
        let name = match rest.first() {
            None | Some(&"") => None,
            Some(_) => Some(rest.join("/")),
        };

        Some(Self { kind, name })
    }
}

impl Datasource {
    /// Serves a resource call.
    ///
    /// `settings` is `None` when the host did not attach instance settings.
    /// Failures are rendered as a JSON error body with the matching status.
    pub async fn call_resource(
        &self,
        settings: Option<&InstanceSettings>,
        request: &ResourceRequest,
        token: &CancellationToken,
    ) -> ResourceResponse {
        match self.route_resource(settings, request, token).await {
            Ok(response) => {
                tracing::debug!(path = %request.path, status = %response.status, "Resource call served");
                response
            }
            Err(e) => {
                let status = e.status();
                if status.is_server_error() {
                    tracing::warn!(path = %request.path, status = %status, error = %e, "Resource call failed");
                } else {
                    tracing::debug!(path = %request.path, status = %status, error = %e, "Resource call rejected");
                }
                ResourceResponse::from(&e)
            }
        }
    }

    async fn route_resource(
        &self,
        settings: Option<&InstanceSettings>,
        request: &ResourceRequest,
        token: &CancellationToken,
    ) -> Result<ResourceResponse, ResourceError> {
        let settings = PluginSettings::load(settings.ok_or(ResourceError::MissingSettings)?)?;
        if !settings.has_url() {
            return Err(ResourceError::MissingUrl);
        }

        let method = Method::parse(&request.method)?;
        let client = MiradorClient::new(&settings.client_config())?;
        let path = SchemaPath::parse(&request.path).ok_or(ResourceError::NotFound)?;
        let name = path.name.as_deref();

        let overrides = self.overrides();
        let cache = self.cache();

        match (method, path.kind, name) {
            (Method::Read, SchemaKind::Logs, None) => {
                list(&cache.logs, &overrides.logs, || client.logs_schema(token)).await
            }
            (Method::Read, SchemaKind::Logs, Some(name)) => {
                entity(&overrides.logs, name, || client.log_field_schema(token, name)).await
            }
            (Method::Read, SchemaKind::Metrics, None) => {
                list(&cache.metrics, &overrides.metrics, || client.metrics_schema(token)).await
            }
            (Method::Read, SchemaKind::Metrics, Some(name)) => {
                entity(&overrides.metrics, name, || client.metric_schema(token, name)).await
            }
            (Method::Read, SchemaKind::Traces, None) => {
                list(&cache.traces, &overrides.traces, || client.traces_schema(token)).await
            }
            (Method::Read, SchemaKind::Traces, Some(name)) => {
                entity(&overrides.traces, name, || client.trace_service_schema(token, name)).await
            }
            (Method::Write, SchemaKind::Logs, name) => {
                self.save(&overrides.logs, name, &request.body)
            }
            (Method::Write, SchemaKind::Metrics, name) => {
                self.save(&overrides.metrics, name, &request.body)
            }
            (Method::Write, SchemaKind::Traces, name) => {
                self.save(&overrides.traces, name, &request.body)
            }
        }
    }

    /// Stores an override and invalidates the cached document of its kind.
    fn save<E>(
        &self,
        registry: &Registry<E>,
        path_name: Option<&str>,
        body: &[u8],
    ) -> Result<ResourceResponse, ResourceError>
    where
        E: SchemaEntry + Serialize + serde::de::DeserializeOwned,
    {
        if body.is_empty() {
            return Err(ResourceError::EmptyBody);
        }
        let payload: E = serde_json::from_slice(body).map_err(ResourceError::InvalidPayload)?;

        if let Some(requested) = path_name {
            if !requested.eq_ignore_ascii_case(payload.name()) {
                return Err(ResourceError::NameMismatch);
            }
        }

        payload.validate_override()?;

        let response = ResourceResponse::ok(&payload);
        tracing::debug!(kind = %E::KIND, name = %payload.name(), "Schema override stored");
        registry.upsert(payload);
        self.cache().invalidate(E::KIND);

        Ok(response)
    }
}

/// Returns the cached (or freshly fetched) document with the overrides merged in.
async fn list<D, F, Fut>(
    slot: &CacheSlot<D>,
    registry: &Registry<D::Entry>,
    fetch: F,
) -> Result<ResourceResponse, ResourceError>
where
    D: SchemaDocument + Clone + Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<D, ClientError>>,
{
    let document = slot.get(fetch).await?;
    Ok(ResourceResponse::ok(&registry.apply(document)))
}

/// Returns the override named `name`, falling back to the upstream entry.
async fn entity<E, F, Fut>(
    registry: &Registry<E>,
    name: &str,
    fetch: F,
) -> Result<ResourceResponse, ResourceError>
where
    E: SchemaEntry + Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<E, ClientError>>,
{
    if let Some(entry) = registry.lookup(name) {
        return Ok(ResourceResponse::ok(&entry));
    }

    let entry = fetch().await?;
    Ok(ResourceResponse::ok(&entry))
}
