//! Trace search payloads and responses.

use super::wire::{is_zero, null_as_default};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /api/v1/traces/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracesQuery {
    /// Backend query string.
    pub query: String,

    /// Maximum number of traces; 0 leaves the choice to the upstream.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: u64,

    /// RFC 3339 start of the search window.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub start: String,

    /// RFC 3339 end of the search window.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end: String,
}

/// A span inside a trace search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSpan {
    /// Span identifier.
    #[serde(rename = "spanID", default)]
    pub span_id: String,

    /// Operation name.
    #[serde(rename = "operationName", default)]
    pub operation_name: String,

    /// Start time as reported by the upstream.
    #[serde(rename = "startTime", default)]
    pub start_time: i64,

    /// Span duration as reported by the upstream.
    #[serde(default)]
    pub duration: i64,

    /// Span tags.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
}

/// A trace search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceData {
    /// Trace identifier.
    #[serde(rename = "traceID", default)]
    pub trace_id: String,

    /// Trace duration (nanoseconds by convention).
    #[serde(default)]
    pub duration: i64,

    /// Spans of the trace.
    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<TraceSpan>,
}

/// The `data` member of a traces response.
///
/// Mirador wraps hits as `{"total": n, "traces": [...]}`; some deployments return
/// the bare array instead, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TracesData {
    /// Wrapped hits.
    Listing {
        /// Total number of matches.
        #[serde(default)]
        total: u64,
        /// The hits.
        #[serde(default, deserialize_with = "null_as_default")]
        traces: Vec<TraceData>,
    },
    /// Bare hit list.
    Bare(Vec<TraceData>),
}

impl Default for TracesData {
    fn default() -> Self {
        Self::Bare(Vec::new())
    }
}

impl TracesData {
    /// Returns the hits regardless of shape.
    #[must_use]
    pub fn traces(&self) -> &[TraceData] {
        match self {
            Self::Listing { traces, .. } | Self::Bare(traces) => traces,
        }
    }
}

/// Search metadata reported alongside trace hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracesMetadata {
    /// Backend that served the search.
    #[serde(default)]
    pub backend: String,
    /// Whether results are partial.
    #[serde(default)]
    pub degraded: bool,
    /// Applied limit.
    #[serde(default)]
    pub limit: u64,
    /// Search time in milliseconds.
    #[serde(default)]
    pub search_time: u64,
    /// Number of traces found.
    #[serde(default)]
    pub traces_found: u64,
}

/// Response of `POST /api/v1/traces/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracesResponse {
    /// Search hits.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: TracesData,

    /// Search metadata.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: TracesMetadata,

    /// Upstream status.
    #[serde(default)]
    pub status: String,
}

impl TracesResponse {
    /// Returns the trace hits.
    #[must_use]
    pub fn traces(&self) -> &[TraceData] {
        self.data.traces()
    }
}
