//! Host bridge endpoints.
//!
//! Exposes the three datasource verbs over HTTP/JSON. Every request carries a
//! `pluginContext` with the instance settings of the datasource it targets:
//!
//! - `POST /api/v1/plugin/query` runs a batch of queries
//! - `POST /api/v1/plugin/resources` serves a resource call
//! - `POST /api/v1/plugin/health` checks the instance
//!
//! Each request owns a cancellation token that fires when the handler is
//! dropped, so upstream calls stop once the host goes away.

use crate::plugin::{
    CheckHealthResult, DataQuery, QueryDataRequest, QueryDataResponse, ResourceRequest,
    ResourceResponse,
};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::config::InstanceSettings;
use tokio_util::sync::CancellationToken;

/// Request context attached by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginContext {
    /// Settings of the targeted datasource instance.
    #[serde(default)]
    pub instance_settings: Option<InstanceSettings>,
}

/// Body of `POST /api/v1/plugin/query`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEnvelope {
    /// Request context.
    #[serde(default)]
    pub plugin_context: PluginContext,
    /// The queries.
    #[serde(default)]
    pub queries: Vec<DataQuery>,
}

/// Body of `POST /api/v1/plugin/resources`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEnvelope {
    /// Request context.
    #[serde(default)]
    pub plugin_context: PluginContext,
    /// Resource method; blank means GET.
    #[serde(default)]
    pub method: String,
    /// Resource path.
    #[serde(default)]
    pub path: String,
    /// Resource body: a JSON document, or its raw text as a string.
    #[serde(default)]
    pub body: Option<Value>,
}

/// Body of `POST /api/v1/plugin/health`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEnvelope {
    /// Request context.
    #[serde(default)]
    pub plugin_context: PluginContext,
}

/// Error body for envelopes that could not be read.
#[derive(Debug, Serialize, Deserialize)]
pub struct BridgeError {
    /// Detailed error message.
    pub error: String,
}

type Rejected = (StatusCode, Json<BridgeError>);

impl IntoResponse for ResourceResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Creates the bridge routes with application state.
pub fn plugin_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/plugin/query", post(query_data))
        .route("/api/v1/plugin/resources", post(call_resource))
        .route("/api/v1/plugin/health", post(check_health))
        .with_state(state)
}

fn unwrap_envelope<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Rejected> {
    payload.map(|Json(envelope)| envelope).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected bridge envelope");
        (
            StatusCode::BAD_REQUEST,
            Json(BridgeError {
                error: rejection.body_text(),
            }),
        )
    })
}

/// Converts the envelope body to the raw bytes of the resource call.
fn raw_body(body: Option<Value>) -> Vec<u8> {
    match body {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(text)) => text.into_bytes(),
        Some(document) => document.to_string().into_bytes(),
    }
}

async fn query_data(
    State(state): State<AppState>,
    payload: Result<Json<QueryEnvelope>, JsonRejection>,
) -> Result<Json<QueryDataResponse>, Rejected> {
    let envelope = unwrap_envelope(payload)?;
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let request = QueryDataRequest {
        queries: envelope.queries,
    };
    let response = state
        .datasource()
        .query_data(
            envelope.plugin_context.instance_settings.as_ref(),
            &request,
            &token,
        )
        .await;

    Ok(Json(response))
}

async fn call_resource(
    State(state): State<AppState>,
    payload: Result<Json<ResourceEnvelope>, JsonRejection>,
) -> Result<ResourceResponse, Rejected> {
    let envelope = unwrap_envelope(payload)?;
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let request = ResourceRequest::new(envelope.method, envelope.path)
        .with_body(raw_body(envelope.body));

    Ok(state
        .datasource()
        .call_resource(
            envelope.plugin_context.instance_settings.as_ref(),
            &request,
            &token,
        )
        .await)
}

async fn check_health(
    State(state): State<AppState>,
    payload: Result<Json<HealthEnvelope>, JsonRejection>,
) -> Result<Json<CheckHealthResult>, Rejected> {
    let envelope = unwrap_envelope(payload)?;
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let result = state
        .datasource()
        .check_health(envelope.plugin_context.instance_settings.as_ref(), &token)
        .await;

    Ok(Json(result))
}
