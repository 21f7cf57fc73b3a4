//! Metric query payloads and responses.
//!
//! Responses follow the Prometheus query API shape: a status and a `data` object
//! holding either instant samples or range matrices.

use super::wire::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label carrying the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Body of `POST /api/v1/query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsQuery {
    /// Backend query expression.
    pub query: String,

    /// Resolution step (e.g. `1m`, `15s`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step: String,

    /// RFC 3339 start of the range.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub start: String,

    /// RFC 3339 end of the range.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end: String,
}

/// Response of `POST /api/v1/query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    /// Upstream status (`success` or `error`).
    #[serde(default)]
    pub status: String,

    /// Result payload.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: MetricsData,
}

/// The `data` object of a metrics response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
    /// `vector`, `matrix`, `scalar` or `string`.
    #[serde(default)]
    pub result_type: String,

    /// The series.
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<MetricSeries>,
}

/// One labelled series.
///
/// Samples are kept as raw JSON pairs because timestamps and values arrive as
/// numbers or strings depending on the backend; the frame projector coerces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    /// Label set, `__name__` included.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metric: BTreeMap<String, String>,

    /// Instant sample `[t, v]`.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub value: Vec<serde_json::Value>,

    /// Range samples `[[t, v], ...]`.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl MetricSeries {
    /// Returns the metric name label, or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.metric
            .get(METRIC_NAME_LABEL)
            .map_or("", String::as_str)
    }
}
