//! Projection of upstream query responses into frames.
//!
//! Every projector returns at least one frame, so an empty result still renders
//! as an empty panel instead of an error.

use super::{Field, FieldValues, Frame, FrameMeta};
use crate::models::{zero_time, LogsResponse, MetricSeries, MetricsResponse, TracesResponse};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Name of the frame produced for log queries.
pub const LOGS_FRAME: &str = "logs";
/// Name of the fallback frame produced for metric queries.
pub const METRICS_FRAME: &str = "metrics";
/// Name of the frame produced for trace searches.
pub const TRACES_FRAME: &str = "traces";

/// Projects log rows into a single table frame.
///
/// The first column is `time`, followed by one string column per field name in
/// order of first appearance. Rows missing a field get an empty string in that
/// column, so all columns have one value per row.
#[must_use]
pub fn logs_to_frames(response: &LogsResponse) -> Vec<Frame> {
    if response.results.is_empty() {
        let frame = Frame::new(LOGS_FRAME)
            .with_field(Field::new("time", FieldValues::Time(Vec::new())))
            .with_meta(FrameMeta::table());
        return vec![frame];
    }

    let mut times = Vec::with_capacity(response.results.len());
    let mut columns: Vec<(String, Vec<String>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (row, entry) in response.results.iter().enumerate() {
        times.push(entry.timestamp().unwrap_or_else(zero_time));

        for (name, value) in entry.attributes() {
            let position = *positions.entry(name.to_string()).or_insert_with(|| {
                columns.push((name.to_string(), vec![String::new(); row]));
                columns.len() - 1
            });
            columns[position].1.push(value.to_string());
        }

        for (_, values) in &mut columns {
            values.resize(row + 1, String::new());
        }
    }

    let frame = columns.into_iter().fold(
        Frame::new(LOGS_FRAME).with_field(Field::new("time", FieldValues::Time(times))),
        |frame, (name, values)| frame.with_field(Field::new(name, FieldValues::String(values))),
    );

    vec![frame.with_meta(FrameMeta::table())]
}

/// Projects metric series into one graph frame per series.
///
/// Range series (`values`) take precedence over instant samples (`value`);
/// series with neither are skipped. If nothing is left, a single empty
/// `metrics` frame is returned.
#[must_use]
pub fn metrics_to_frames(response: &MetricsResponse) -> Vec<Frame> {
    let mut frames: Vec<Frame> = response
        .data
        .result
        .iter()
        .filter_map(series_to_frame)
        .collect();

    if frames.is_empty() {
        frames.push(Frame::new(METRICS_FRAME));
    }

    frames
}

fn series_to_frame(series: &MetricSeries) -> Option<Frame> {
    let (times, values): (Vec<DateTime<Utc>>, Vec<f64>) = if !series.values.is_empty() {
        series.values.iter().map(|pair| sample(pair)).unzip()
    } else if series.value.len() == 2 {
        let (time, value) = sample(&series.value);
        (vec![time], vec![value])
    } else {
        return None;
    };

    let labels = series
        .metric
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    let frame = Frame::new(series.name())
        .with_field(Field::new("time", FieldValues::Time(times)))
        .with_field(Field::new("value", FieldValues::Float64(values)))
        .with_meta(FrameMeta::graph().with_custom("labels", Value::Object(labels)));

    Some(frame)
}

/// Coerces a `[t, v]` pair, treating missing members as unparseable.
fn sample(pair: &[Value]) -> (DateTime<Utc>, f64) {
    let time = pair.first().map_or_else(zero_time, to_time);
    let value = pair.get(1).and_then(to_float).unwrap_or(0.0);
    (time, value)
}

/// Projects trace search hits into a single table frame.
///
/// Columns are `traceID`, `duration` and `spanCount`. An empty search yields an
/// empty `traces` frame without columns.
#[must_use]
pub fn traces_to_frames(response: &TracesResponse) -> Vec<Frame> {
    let traces = response.traces();
    if traces.is_empty() {
        return vec![Frame::new(TRACES_FRAME)];
    }

    let trace_ids = traces.iter().map(|trace| trace.trace_id.clone()).collect();
    let durations = traces.iter().map(|trace| trace.duration).collect();
    let span_counts = traces
        .iter()
        .map(|trace| i64::try_from(trace.spans.len()).unwrap_or(i64::MAX))
        .collect();

    let frame = Frame::new(TRACES_FRAME)
        .with_field(Field::new("traceID", FieldValues::String(trace_ids)))
        .with_field(Field::new("duration", FieldValues::Int64(durations)))
        .with_field(Field::new("spanCount", FieldValues::Int64(span_counts)))
        .with_meta(FrameMeta::table());

    vec![frame]
}

/// Coerces a sample timestamp.
///
/// Numbers are Unix seconds (fractions kept to the nanosecond). Strings are tried
/// as seconds first, then as RFC 3339. Anything else maps to the zero time.
#[must_use]
pub fn to_time(raw: &Value) -> DateTime<Utc> {
    match raw {
        Value::Number(number) => number.as_f64().map_or_else(zero_time, from_unix_seconds),
        Value::String(text) => match text.parse::<f64>() {
            Ok(seconds) => from_unix_seconds(seconds),
            Err(_) => crate::models::parse_rfc3339(text).unwrap_or_else(zero_time),
        },
        _ => zero_time(),
    }
}

/// Coerces a sample value. Numbers and numeric strings parse; anything else is `None`.
#[must_use]
pub fn to_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse::<f64>().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_unix_seconds(seconds: f64) -> DateTime<Utc> {
    if !seconds.is_finite() {
        return zero_time();
    }

    let mut whole = seconds.floor();
    let mut nanos = ((seconds - whole) * 1e9).round();
    if nanos >= 1e9 {
        whole += 1.0;
        nanos = 0.0;
    }

    DateTime::from_timestamp(whole as i64, nanos as u32).unwrap_or_else(zero_time)
}
