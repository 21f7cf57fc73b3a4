//! Query plane.
//!
//! Each query of a batch is decoded into a [`QueryModel`], dispatched on its
//! `queryType` to one of the three upstream query endpoints, and projected into
//! frames. Queries run one after another; a failing query only fails its own
//! result slot.

use super::Datasource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::client::{ClientError, MiradorClient};
use shared::config::{InstanceSettings, PluginSettings, SettingsError};
use shared::frame::{logs_to_frames, metrics_to_frames, traces_to_frames, Frame};
use shared::models::{
    format_duration, format_rfc3339_nano, is_zero_time, LogsQuery, MetricsQuery, TimeSpan,
    TracesQuery,
};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Step used when neither the query nor the host supplies one.
const DEFAULT_STEP: &str = "1m";

/// The time window of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the window.
    pub from: DateTime<Utc>,
    /// End of the window.
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a time range.
    #[must_use]
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    fn start(&self) -> String {
        format_rfc3339_nano(&self.from)
    }

    fn end(&self) -> String {
        format_rfc3339_nano(&self.to)
    }
}

/// One query of a batch as sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    /// Identifier the result is reported under.
    pub ref_id: String,

    /// The query descriptor, decoded into a [`QueryModel`].
    #[serde(default)]
    pub json: serde_json::Value,

    /// Time window.
    #[serde(default)]
    pub time_range: TimeRange,

    /// Suggested resolution in milliseconds; 0 when the host has none.
    #[serde(default)]
    pub interval_ms: u64,
}

impl DataQuery {
    /// Creates a query.
    #[must_use]
    pub fn new(ref_id: impl Into<String>, json: serde_json::Value) -> Self {
        Self {
            ref_id: ref_id.into(),
            json,
            ..Self::default()
        }
    }

    /// Sets the time range.
    #[must_use]
    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    /// Sets the host interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the host interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// The query descriptor authored in the query editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryModel {
    /// `logs`, `metrics` or `traces`; anything else runs as logs.
    pub query_type: String,
    /// Backend query string.
    pub query: String,
    /// Query language hint from the editor. Not interpreted.
    pub query_language: String,
    /// Row or trace limit; 0 leaves the choice to the upstream.
    pub limit: u64,
    /// Log fields to return.
    pub fields: Vec<String>,
    /// Metrics resolution step.
    pub step: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Logs,
    Metrics,
    Traces,
}

impl QueryModel {
    fn kind(&self) -> QueryKind {
        match self.query_type.to_ascii_lowercase().as_str() {
            "metrics" => QueryKind::Metrics,
            "traces" => QueryKind::Traces,
            _ => QueryKind::Logs,
        }
    }

    fn logs_query(&self, range: &TimeRange) -> LogsQuery {
        LogsQuery {
            query: self.query.clone(),
            limit: self.limit,
            fields: self.fields.clone(),
            time_range: (!is_zero_time(&range.from)).then(|| TimeSpan::new(&range.from, &range.to)),
        }
    }

    fn metrics_query(&self, range: &TimeRange, interval: Duration) -> MetricsQuery {
        let step = if !self.step.is_empty() {
            self.step.clone()
        } else if !interval.is_zero() {
            format_duration(interval)
        } else {
            DEFAULT_STEP.to_string()
        };

        MetricsQuery {
            query: self.query.clone(),
            step,
            start: range.start(),
            end: range.end(),
        }
    }

    fn traces_query(&self, range: &TimeRange) -> TracesQuery {
        TracesQuery {
            query: self.query.clone(),
            limit: self.limit,
            start: range.start(),
            end: range.end(),
        }
    }
}

/// A batch of queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDataRequest {
    /// The queries, in execution order.
    #[serde(default)]
    pub queries: Vec<DataQuery>,
}

/// Failure class of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// The request or the instance configuration is wrong.
    BadRequest,
    /// The upstream call failed.
    Internal,
}

/// The result of one query: frames or an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Frames of a successful query.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,

    /// Error message of a failed query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure class of a failed query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QueryStatus>,
}

impl DataResponse {
    /// A successful result.
    #[must_use]
    pub fn with_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// A failed result.
    #[must_use]
    pub fn with_error(status: QueryStatus, message: impl Into<String>) -> Self {
        Self {
            frames: Vec::new(),
            error: Some(message.into()),
            status: Some(status),
        }
    }

    /// Returns true if the query failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Results of a batch keyed by `refId`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDataResponse {
    /// One slot per query.
    pub responses: BTreeMap<String, DataResponse>,
}

impl QueryDataResponse {
    /// Returns the result of `ref_id`.
    #[must_use]
    pub fn get(&self, ref_id: &str) -> Option<&DataResponse> {
        self.responses.get(ref_id)
    }
}

#[derive(Debug, Error)]
enum QueryError {
    #[error("missing datasource settings")]
    MissingSettings,

    #[error("load settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Mirador API URL is not configured")]
    MissingUrl,

    #[error("json unmarshal: {0}")]
    InvalidQuery(serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl QueryError {
    fn status(&self) -> QueryStatus {
        match self {
            Self::Client(e) if !e.is_config() => QueryStatus::Internal,
            _ => QueryStatus::BadRequest,
        }
    }
}

impl Datasource {
    /// Runs every query of a batch, in order.
    ///
    /// `settings` is `None` when the host did not attach instance settings.
    pub async fn query_data(
        &self,
        settings: Option<&InstanceSettings>,
        request: &QueryDataRequest,
        token: &CancellationToken,
    ) -> QueryDataResponse {
        let mut response = QueryDataResponse::default();

        for query in &request.queries {
            let result = match run_query(settings, query, token).await {
                Ok(frames) => {
                    tracing::debug!(ref_id = %query.ref_id, frames = frames.len(), "Query executed");
                    DataResponse::with_frames(frames)
                }
                Err(e) => {
                    let status = e.status();
                    if status == QueryStatus::Internal {
                        tracing::warn!(ref_id = %query.ref_id, error = %e, "Query failed");
                    } else {
                        tracing::debug!(ref_id = %query.ref_id, error = %e, "Query rejected");
                    }
                    DataResponse::with_error(status, e.to_string())
                }
            };
            response.responses.insert(query.ref_id.clone(), result);
        }

        response
    }
}

async fn run_query(
    settings: Option<&InstanceSettings>,
    query: &DataQuery,
    token: &CancellationToken,
) -> Result<Vec<Frame>, QueryError> {
    let settings = PluginSettings::load(settings.ok_or(QueryError::MissingSettings)?)?;
    if !settings.has_url() {
        return Err(QueryError::MissingUrl);
    }

    let client = MiradorClient::new(&settings.client_config())?;
    let model: QueryModel =
        serde_json::from_value(query.json.clone()).map_err(QueryError::InvalidQuery)?;

    let frames = match model.kind() {
        QueryKind::Metrics => {
            let payload = model.metrics_query(&query.time_range, query.interval());
            metrics_to_frames(&client.query_metrics(token, &payload).await?)
        }
        QueryKind::Traces => {
            let payload = model.traces_query(&query.time_range);
            traces_to_frames(&client.query_traces(token, &payload).await?)
        }
        QueryKind::Logs => {
            let payload = model.logs_query(&query.time_range);
            logs_to_frames(&client.query_logs(token, &payload).await?)
        }
    };

    Ok(frames)
}
