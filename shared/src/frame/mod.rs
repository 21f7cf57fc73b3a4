//! Columnar data frames returned to the dashboard host.
//!
//! A [`Frame`] is a named list of typed columns ([`Field`]) plus presentation
//! metadata. The projector functions in [`projector`] build frames from upstream
//! query responses.

pub mod projector;

pub use projector::{logs_to_frames, metrics_to_frames, to_float, to_time, traces_to_frames};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the host should render a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visualization {
    /// Tabular rendering.
    Table,
    /// Time series plot.
    Graph,
}

/// Frame level presentation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    /// Rendering hint.
    pub preferred_visualization: Visualization,

    /// Free-form metadata (e.g. series labels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Map<String, serde_json::Value>>,
}

impl FrameMeta {
    /// Metadata for a table frame.
    #[must_use]
    pub fn table() -> Self {
        Self {
            preferred_visualization: Visualization::Table,
            custom: None,
        }
    }

    /// Metadata for a graph frame.
    #[must_use]
    pub fn graph() -> Self {
        Self {
            preferred_visualization: Visualization::Graph,
            custom: None,
        }
    }

    /// Adds a custom metadata entry.
    #[must_use]
    pub fn with_custom(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        self
    }
}

/// Typed column values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FieldValues {
    /// UTC timestamps.
    Time(Vec<DateTime<Utc>>),
    /// Strings.
    String(Vec<String>),
    /// 64-bit floats.
    Float64(Vec<f64>),
    /// 64-bit integers.
    Int64(Vec<i64>),
}

impl FieldValues {
    /// Number of values in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Time(values) => values.len(),
            Self::String(values) => values.len(),
            Self::Float64(values) => values.len(),
            Self::Int64(values) => values.len(),
        }
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,

    /// Column values.
    #[serde(flatten)]
    pub values: FieldValues,
}

impl Field {
    /// Creates a column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: FieldValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Returns the string at `row`, if this is a string column.
    #[must_use]
    pub fn string_at(&self, row: usize) -> Option<&str> {
        match &self.values {
            FieldValues::String(values) => values.get(row).map(String::as_str),
            _ => None,
        }
    }

    /// Returns the float at `row`, if this is a float column.
    #[must_use]
    pub fn float_at(&self, row: usize) -> Option<f64> {
        match &self.values {
            FieldValues::Float64(values) => values.get(row).copied(),
            _ => None,
        }
    }

    /// Returns the integer at `row`, if this is an integer column.
    #[must_use]
    pub fn int_at(&self, row: usize) -> Option<i64> {
        match &self.values {
            FieldValues::Int64(values) => values.get(row).copied(),
            _ => None,
        }
    }

    /// Returns the timestamp at `row`, if this is a time column.
    #[must_use]
    pub fn time_at(&self, row: usize) -> Option<DateTime<Utc>> {
        match &self.values {
            FieldValues::Time(values) => values.get(row).copied(),
            _ => None,
        }
    }
}

/// A columnar result unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame name.
    pub name: String,

    /// Columns, in display order.
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Presentation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

impl Frame {
    /// Creates a frame without columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            meta: None,
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: FrameMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Looks a column up by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Number of rows, i.e. the length of the longest column.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.fields
            .iter()
            .map(|field| field.values.len())
            .max()
            .unwrap_or(0)
    }

    /// Returns the preferred visualization, if any.
    #[must_use]
    pub fn visualization(&self) -> Option<Visualization> {
        self.meta.as_ref().map(|meta| meta.preferred_visualization)
    }
}
