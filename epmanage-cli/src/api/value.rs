//! Typed field values and the converter for user-supplied edits.

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use epmanage_shared::schema::FieldType;
use serde_json::Value;

/// Delimiter for list values typed on the command line.
pub const LIST_DELIMITER: char = '|';

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    /// Structured values (dicts, media, unknown types) kept as received.
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("{0}")]
    Integer(#[from] std::num::ParseIntError),

    #[error("cannot parse '{0}' as a date")]
    Datetime(String),

    #[error("This type cannot be edited")]
    NotEditable(Option<FieldType>),
}

/// Convert a raw command line value to the declared field type.
pub fn convert(field_type: Option<&FieldType>, raw: &str) -> Result<FieldValue, ConversionError> {
    match field_type {
        Some(FieldType::String) => Ok(FieldValue::String(raw.to_string())),
        Some(FieldType::Integer) => Ok(FieldValue::Integer(raw.trim().parse()?)),
        Some(FieldType::Boolean) => Ok(FieldValue::Boolean(raw.eq_ignore_ascii_case("true"))),
        Some(FieldType::Datetime) => parse_datetime(raw)
            .map(FieldValue::Timestamp)
            .ok_or_else(|| ConversionError::Datetime(raw.to_string())),
        Some(FieldType::List) => Ok(FieldValue::List(
            raw.split(LIST_DELIMITER)
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        other => Err(ConversionError::NotEditable(other.cloned())),
    }
}

/// Accepts RFC 3339, RFC 2822 (the HTTP date format the backend emits),
/// the other ISO 8601 shapes (offsets without colon, minute precision, basic
/// format), naive date-times and bare dates. Naive values are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let zoned = match raw.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+0000", rest),
        None => raw.to_string(),
    };
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f%#z",
        "%Y-%m-%dT%H:%M%#z",
        "%Y%m%dT%H%M%S%.f%#z",
        "%Y%m%dT%H%M%#z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y%m%dT%H%M%S%.f",
        "%Y%m%dT%H%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    ["%Y-%m-%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl FieldValue {
    /// Interpret a server JSON value according to the declared type.
    ///
    /// Values that do not fit the declared type are kept as `Raw` rather
    /// than rejected; the backend owns the schema.
    pub fn from_json(field_type: Option<&FieldType>, value: &Value) -> Self {
        match (field_type, value) {
            (_, Value::Null) => FieldValue::Null,
            (Some(FieldType::String | FieldType::ObjectId), Value::String(s)) => {
                FieldValue::String(s.clone())
            }
            (Some(FieldType::Integer), Value::Number(n)) if n.is_i64() => {
                FieldValue::Integer(n.as_i64().unwrap_or_default())
            }
            (Some(FieldType::Number), Value::Number(n)) if n.is_i64() => {
                FieldValue::Integer(n.as_i64().unwrap_or_default())
            }
            (Some(FieldType::Float | FieldType::Number), Value::Number(n)) => n
                .as_f64()
                .map(FieldValue::Float)
                .unwrap_or_else(|| FieldValue::Raw(value.clone())),
            (Some(FieldType::Boolean), Value::Bool(b)) => FieldValue::Boolean(*b),
            (Some(FieldType::Datetime), Value::String(s)) => parse_datetime(s)
                .map(FieldValue::Timestamp)
                .unwrap_or_else(|| FieldValue::String(s.clone())),
            (Some(FieldType::List), Value::Array(items)) => FieldValue::List(items.clone()),
            _ => FieldValue::Raw(value.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Timestamp(t) => {
                Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FieldValue::List(items) => Value::Array(items.clone()),
            FieldValue::Raw(v) => v.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => f.write_str("None"),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Timestamp(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                f.write_str(&parts.join(&LIST_DELIMITER.to_string()))
            }
            FieldValue::Raw(v) => write!(f, "{}", v),
        }
    }
}
