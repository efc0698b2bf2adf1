//! Payload checks for history mutations.
//!
//! Bodies arrive as raw bytes so that ownership is always checked before any
//! of this runs. Nothing in here touches storage.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

pub const POSITIVE_VALUE_REQUIRED: &str = "value must be a positive number";
pub const VALUE_OUT_OF_RANGE: &str =
    "value must be at most 1000000000000000 with no more than 28 decimal places";
pub const VALID_DATETIME_REQUIRED: &str = "datetime must be a valid ISO-8601 timestamp";

/// Largest accepted history value. Keeps the cross-user total far from overflow.
pub const MAX_VALUE: i64 = 1_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    MalformedBody,
    #[error("datetime and value are required")]
    MissingField,
    #[error("{0}")]
    InvalidValue(&'static str),
    #[error("No fields to update")]
    NoFields,
}

/// A fully validated history ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistory {
    pub datetime: DateTime<Utc>,
    pub value: Decimal,
}

/// Partial update set. At least one of `datetime` / `value` is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChanges {
    pub datetime: Option<DateTime<Utc>>,
    pub value: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl HistoryChanges {
    /// Number of caller-supplied fields (excludes `updated_at`).
    pub fn field_count(&self) -> usize {
        usize::from(self.datetime.is_some()) + usize::from(self.value.is_some())
    }
}

/// Parse a request body into a JSON object. An empty body reads as `{}`.
pub fn parse_body(raw: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError::MalformedBody),
    }
}

pub fn validate_create(body: &Map<String, Value>) -> Result<NewHistory, ValidationError> {
    let datetime = body.get("datetime").filter(|v| is_truthy(v));
    let value = body.get("value").filter(|v| !v.is_null());

    let (Some(datetime), Some(value)) = (datetime, value) else {
        return Err(ValidationError::MissingField);
    };

    let value = positive_value(value)?;
    let datetime = parse_datetime(datetime)?;

    Ok(NewHistory { datetime, value })
}

pub fn validate_update(body: &Map<String, Value>) -> Result<HistoryChanges, ValidationError> {
    let datetime = body.get("datetime").map(parse_datetime).transpose()?;
    let value = body.get("value").map(positive_value).transpose()?;

    let changes = HistoryChanges {
        datetime,
        value,
        updated_at: Utc::now(),
    };

    if changes.field_count() == 0 {
        return Err(ValidationError::NoFields);
    }

    Ok(changes)
}

/// Accepts JSON numbers in `(0, MAX_VALUE]`, keeping the literal's precision.
fn positive_value(value: &Value) -> Result<Decimal, ValidationError> {
    let Value::Number(number) = value else {
        return Err(ValidationError::InvalidValue(POSITIVE_VALUE_REQUIRED));
    };
    if !number.as_f64().is_some_and(|f| f > 0.0) {
        return Err(ValidationError::InvalidValue(POSITIVE_VALUE_REQUIRED));
    }

    let out_of_range = ValidationError::InvalidValue(VALUE_OUT_OF_RANGE);
    let literal = number.to_string();
    let decimal = Decimal::from_str(&literal)
        .or_else(|_| Decimal::from_scientific(&literal))
        .map_err(|_| out_of_range.clone())?;

    // Positive literals too small for the decimal scale parse as zero
    if decimal <= Decimal::ZERO || decimal > Decimal::from(MAX_VALUE) {
        return Err(out_of_range);
    }

    Ok(decimal)
}

/// RFC 3339 strings, zone-less date-times (read as UTC), plain dates, or epoch milliseconds.
fn parse_datetime(value: &Value) -> Result<DateTime<Utc>, ValidationError> {
    let invalid = ValidationError::InvalidValue(VALID_DATETIME_REQUIRED);

    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Ok(parsed.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                    return Ok(Utc.from_utc_datetime(&naive));
                }
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
                .ok_or(invalid)
        }
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or(invalid),
        _ => Err(invalid),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
