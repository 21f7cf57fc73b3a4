//! Timestamp helpers shared by the query payloads and the frame projector.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// The zero time used when an upstream timestamp cannot be interpreted.
#[must_use]
pub fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Returns true if `time` is the zero time.
#[must_use]
pub fn is_zero_time(time: &DateTime<Utc>) -> bool {
    *time == zero_time()
}

/// Formats a timestamp as RFC 3339 in UTC with nanosecond precision.
///
/// Trailing zeros of the fractional second are dropped, and so is the
/// fraction itself when it is zero: `2025-01-01T00:00:00Z`,
/// `2025-01-01T00:00:00.25Z`.
#[must_use]
pub fn format_rfc3339_nano(time: &DateTime<Utc>) -> String {
    let mut formatted = time.format("%Y-%m-%dT%H:%M:%S%.9f").to_string();
    while formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }
    formatted.push('Z');
    formatted
}

/// Parses an RFC 3339 timestamp into UTC.
#[must_use]
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Renders a duration as a step string.
///
/// Whole seconds become `"<n>s"`, whole milliseconds `"<n>ms"`; anything else
/// uses the compact unit form (`1h2m3.4s`, `1.5ms`, `2.5µs`, `150ns`).
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        return format!("{}s", duration.as_secs());
    }
    if duration.subsec_nanos() % 1_000_000 == 0 {
        return format!("{}ms", duration.as_millis());
    }

    let nanos = duration.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", fixed_point(nanos, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", fixed_point(nanos, 6));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = u128::from(total_secs % 60) * 1_000_000_000 + u128::from(duration.subsec_nanos());

    let mut formatted = String::new();
    if hours > 0 {
        formatted.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        formatted.push_str(&format!("{minutes}m"));
    }
    formatted.push_str(&fixed_point(seconds, 9));
    formatted.push('s');
    formatted
}

/// Renders `value / 10^scale` with trailing fractional zeros removed.
fn fixed_point(value: u128, scale: u32) -> String {
    let divisor = 10u128.pow(scale);
    let whole = value / divisor;
    let fraction = value % divisor;
    if fraction == 0 {
        return whole.to_string();
    }

    let digits = format!("{fraction:0width$}", width = scale as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
