//! Log query payloads and responses.
//!
//! Mirador returns log rows as free-form field maps. The reserved `_time` field
//! holds the event timestamp; everything else is kept as a scalar value.

use super::time::{format_rfc3339_nano, parse_rfc3339};
use super::wire::{is_zero, null_as_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the reserved timestamp field in a log row.
pub const TIME_FIELD: &str = "_time";

/// A time window serialised as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Inclusive start.
    pub from: String,
    /// End of the window.
    pub to: String,
}

impl TimeSpan {
    /// Builds a span from two UTC timestamps.
    #[must_use]
    pub fn new(from: &DateTime<Utc>, to: &DateTime<Utc>) -> Self {
        Self {
            from: format_rfc3339_nano(from),
            to: format_rfc3339_nano(to),
        }
    }
}

/// Body of `POST /api/v1/logs/query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    /// Backend query string.
    pub query: String,

    /// Maximum number of rows; 0 leaves the choice to the upstream.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: u64,

    /// Fields to return.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Time window of the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeSpan>,
}

/// A scalar value of a log field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number, kept in its original representation.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// Objects and arrays, kept verbatim.
    Composite(serde_json::Value),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Composite(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// One log row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntry {
    /// All fields of the row, `_time` included.
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEntry {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the row.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the parsed `_time` field, if present and valid.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.fields.get(TIME_FIELD) {
            Some(FieldValue::String(raw)) => parse_rfc3339(raw),
            _ => None,
        }
    }

    /// Returns a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterates over every field except `_time`, in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .filter(|(name, _)| name.as_str() != TIME_FIELD)
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// Response of `POST /api/v1/logs/query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Matching rows.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<LogEntry>,

    /// Total number of matches reported by the upstream.
    #[serde(default)]
    pub total: u64,

    /// Upstream processing time in milliseconds.
    #[serde(default)]
    pub took: u64,
}
