//! Wire models exchanged with Mirador Core.
//!
//! This module contains the query payloads, query responses and schema documents.

pub mod log;
pub mod metric;
pub mod schema;
pub mod time;
pub mod trace;
mod wire;

pub use log::{FieldValue, LogEntry, LogsQuery, LogsResponse, TimeSpan, TIME_FIELD};
pub use metric::{MetricSeries, MetricsData, MetricsQuery, MetricsResponse, METRIC_NAME_LABEL};
pub use schema::{
    LogsSchema, MetricDescriptor, MetricsSchema, SchemaField, SchemaKind, SchemaValidationError,
    TraceOperationSpec, TraceServiceSchema, TracesSchema,
};
pub use time::{format_duration, format_rfc3339_nano, is_zero_time, parse_rfc3339, zero_time};
pub use trace::{TraceData, TraceSpan, TracesData, TracesMetadata, TracesQuery, TracesResponse};
