//! Date engine: detection, formatting, and arithmetic over a closed set of
//! formats and units.
//!
//! The auto-detector accepts, in order: offsetted ISO-8601, naive ISO-8601
//! (treated as UTC), date-only ISO-8601 (midnight UTC), 10-digit unix
//! seconds, and 13-digit unix milliseconds. Digit forms are accepted both
//! as strings and as integer numbers.
//!
//! Output formats: `iso8601`, `iso8601_basic`, `unix`, `unix_ms`, `human`,
//! `date_only`, `time_only`. Everything emitted is a JSON string, including
//! the unix forms.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Detect a date in `value`, yielding a UTC instant.
pub fn detect(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => detect_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(detect_unix),
        _ => None,
    }
}

fn detect_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        match s.len() {
            10 => return DateTime::from_timestamp(s.parse().ok()?, 0),
            13 => return DateTime::from_timestamp_millis(s.parse().ok()?),
            _ => {}
        }
    }
    None
}

/// Interpret an integer as unix seconds (10 digits) or milliseconds (13).
fn detect_unix(n: i64) -> Option<DateTime<Utc>> {
    match n {
        1_000_000_000..=9_999_999_999 => DateTime::from_timestamp(n, 0),
        1_000_000_000_000..=9_999_999_999_999 => DateTime::from_timestamp_millis(n),
        _ => None,
    }
}

/// Format an instant in one of the named output formats.
///
/// Returns `None` for an unrecognized format name, which callers treat as
/// identity for the step. The fixed patterns carry their own `Z`/`UTC`
/// suffixes; the zone only affects the wall-clock fields.
pub fn emit<Z: TimeZone>(dt: &DateTime<Z>, format: &str) -> Option<Value>
where
    Z::Offset: std::fmt::Display,
{
    let text = match format {
        "iso8601" => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "iso8601_basic" => dt.format("%Y%m%dT%H%M%SZ").to_string(),
        "unix" => dt.timestamp().to_string(),
        "unix_ms" => dt.timestamp_millis().to_string(),
        "human" => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "date_only" => dt.format("%Y-%m-%d").to_string(),
        "time_only" => dt.format("%H:%M:%S").to_string(),
        _ => return None,
    };
    Some(Value::String(text))
}

/// Read the clock in the named zone (unknown zones fall back to UTC) and
/// format it.
pub fn now_formatted(format: &str, timezone: &str) -> Option<Value> {
    let now = Utc::now();
    match timezone.parse::<Tz>() {
        Ok(tz) => emit(&now.with_timezone(&tz), format),
        Err(_) => emit(&now, format),
    }
}

/// Shift an instant by `amount` units. `months` counts as 30 days and
/// `years` as 365; the amount may be negative.
pub fn add(dt: &DateTime<Utc>, amount: i64, unit: &str) -> Option<DateTime<Utc>> {
    let unit_secs: i64 = match unit {
        "seconds" => 1,
        "minutes" => 60,
        "hours" => 3_600,
        "days" => 86_400,
        "weeks" => 604_800,
        "months" => 30 * 86_400,
        "years" => 365 * 86_400,
        _ => return None,
    };
    let total = amount.checked_mul(unit_secs)?;
    dt.checked_add_signed(Duration::try_seconds(total)?)
}

/// `to - from` in the requested unit: an integer Number for `seconds`, a
/// real Number for `minutes`/`hours`/`days`/`weeks`.
pub fn diff(from: &DateTime<Utc>, to: &DateTime<Utc>, unit: &str) -> Option<Value> {
    let delta = to.signed_duration_since(*from);
    match unit {
        "seconds" => Some(Value::Number(delta.num_seconds().into())),
        "minutes" | "hours" | "days" | "weeks" => {
            let unit_secs: f64 = match unit {
                "minutes" => 60.0,
                "hours" => 3_600.0,
                "days" => 86_400.0,
                _ => 604_800.0,
            };
            let value = delta.num_milliseconds() as f64 / 1_000.0 / unit_secs;
            serde_json::Number::from_f64(value).map(Value::Number)
        }
        _ => None,
    }
}
