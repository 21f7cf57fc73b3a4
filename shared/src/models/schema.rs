//! Schema documents published by Mirador Core.
//!
//! There is one document per signal kind: log fields, metric descriptors and trace
//! services. Each document is a list of named entries plus an optional version.

use super::wire::{is_blank, is_false, null_as_default};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

/// The three kinds of telemetry the connector exposes schemas for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Log fields.
    Logs,
    /// Metric descriptors.
    Metrics,
    /// Trace services.
    Traces,
}

impl SchemaKind {
    /// Parses a kind from a path segment, ignoring ASCII case.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "logs" => Some(Self::Logs),
            "metrics" => Some(Self::Metrics),
            "traces" => Some(Self::Traces),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logs => write!(f, "logs"),
            Self::Metrics => write!(f, "metrics"),
            Self::Traces => write!(f, "traces"),
        }
    }
}

/// Errors raised when a user-supplied schema entry is incomplete.
#[derive(Debug, Error)]
pub enum SchemaValidationError {
    /// Log fields and metrics need both a name and a type.
    #[error("name and type are required")]
    NameAndTypeRequired,

    /// Trace services need a name.
    #[error("name is required")]
    NameRequired,
}

/// Rejects empty and whitespace-only values.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// A single log field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// Field name.
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Field name cannot be empty"))]
    pub name: String,

    /// Field type (e.g. `keyword`, `text`, `long`).
    #[serde(rename = "type", default)]
    #[validate(custom(function = "not_blank", message = "Field type cannot be empty"))]
    pub field_type: String,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub description: Option<String>,

    /// Example values.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub examples: Vec<String>,

    /// Whether the field supports aggregations.
    #[serde(default, skip_serializing_if = "is_false")]
    pub aggregatable: bool,

    /// Whether the field can be filtered on.
    #[serde(default, skip_serializing_if = "is_false")]
    pub filterable: bool,

    /// Display format hint.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub default_format: Option<String>,
}

impl SchemaField {
    /// Creates a field with a name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates that the name and type are present.
    ///
    /// # Errors
    ///
    /// Returns an error if either the name or the type is blank.
    pub fn validate_entry(&self) -> Result<(), SchemaValidationError> {
        self.validate()
            .map_err(|_| SchemaValidationError::NameAndTypeRequired)
    }
}

/// Document listing every known log field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsSchema {
    /// The log fields.
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<SchemaField>,

    /// Upstream schema version.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub version: Option<String>,
}

/// A single metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MetricDescriptor {
    /// Metric name.
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Metric name cannot be empty"))]
    pub name: String,

    /// Metric type (e.g. `counter`, `gauge`, `histogram`).
    #[serde(rename = "type", default)]
    #[validate(custom(function = "not_blank", message = "Metric type cannot be empty"))]
    pub metric_type: String,

    /// Unit of the metric.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub unit: Option<String>,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub description: Option<String>,

    /// Label names carried by the metric.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub labels: Vec<String>,

    /// Aggregations that make sense for the metric.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aggregations: Vec<String>,
}

impl MetricDescriptor {
    /// Creates a descriptor with a name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, metric_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_type: metric_type.into(),
            ..Self::default()
        }
    }

    /// Validates that the name and type are present.
    ///
    /// # Errors
    ///
    /// Returns an error if either the name or the type is blank.
    pub fn validate_entry(&self) -> Result<(), SchemaValidationError> {
        self.validate()
            .map_err(|_| SchemaValidationError::NameAndTypeRequired)
    }
}

/// Document listing every known metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSchema {
    /// The metric descriptors.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: Vec<MetricDescriptor>,

    /// Upstream schema version.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub version: Option<String>,
}

/// An operation exposed by a traced service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceOperationSpec {
    /// Operation name.
    #[serde(default)]
    pub name: String,

    /// Span kinds emitted for the operation.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub span_kinds: Vec<String>,

    /// Span attributes specific to the operation.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attributes: Vec<SchemaField>,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub description: Option<String>,
}

/// A traced service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TraceServiceSchema {
    /// Service name.
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Service name cannot be empty"))]
    pub name: String,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub description: Option<String>,

    /// Operations of the service.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub operations: Vec<TraceOperationSpec>,

    /// Attributes common to every span of the service.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attributes: Vec<SchemaField>,
}

impl TraceServiceSchema {
    /// Creates a service entry with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validates that the name is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty.
    pub fn validate_entry(&self) -> Result<(), SchemaValidationError> {
        self.validate()
            .map_err(|_| SchemaValidationError::NameRequired)
    }
}

/// Document listing every known traced service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracesSchema {
    /// The services.
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<TraceServiceSchema>,

    /// Upstream schema version.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub version: Option<String>,
}
