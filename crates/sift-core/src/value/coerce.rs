use crate::{model::FieldKind, value::Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error as ThisError;

///
/// Value coercion
///
/// Converts a loosely-typed operand into the native value of a target
/// attribute. The operand is rendered to text and parsed according to the
/// attribute's `FieldKind`; relation and opaque kinds pass through untouched.
///

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const OFFSET_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%#z"];

///
/// CoerceError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("the value '{value}' is not compatible with type {target}")]
pub struct CoerceError {
    pub value: String,
    pub target: &'static str,
}

/// Coerce `raw` into the native type described by `kind`.
///
/// `Null` never coerces into a scalar kind; null checks have dedicated
/// operations.
pub fn coerce(raw: &Value, kind: FieldKind) -> Result<Value, CoerceError> {
    if kind.target().is_some() || matches!(kind, FieldKind::Other(_)) {
        return Ok(raw.clone());
    }
    if raw.is_null() {
        return Err(rejected(raw, kind));
    }

    let text = raw.to_string();
    let coerced = match kind {
        FieldKind::Text => Some(Value::Text(text)),
        FieldKind::Int => text.parse::<i32>().ok().map(|v| Value::Int(v.into())),
        FieldKind::Long => text.parse::<i64>().ok().map(Value::Int),
        FieldKind::Float => text.parse::<f32>().ok().map(|v| Value::Float(v.into())),
        FieldKind::Double => text.parse::<f64>().ok().map(Value::Float),
        FieldKind::Bool => parse_bool(&text).map(Value::Bool),
        FieldKind::Date => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .ok()
            .map(Value::Date),
        FieldKind::DateTime => parse_date_time(&text).map(Value::DateTime),
        FieldKind::OffsetDateTime => parse_offset_date_time(&text).map(Value::OffsetDateTime),
        FieldKind::Relation(_) | FieldKind::Collection(_) | FieldKind::Other(_) => {
            Some(raw.clone())
        }
    };

    coerced.ok_or_else(|| rejected(raw, kind))
}

// Case-sensitive; anything but the two literals is rejected.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

// RFC 3339 also allows a space between date and time; ISO does not.
fn parse_offset_date_time(text: &str) -> Option<DateTime<chrono::FixedOffset>> {
    if text.as_bytes().get(10) != Some(&b'T') {
        return None;
    }

    DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        OFFSET_DATE_TIME_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(text, format).ok())
    })
}

fn rejected(raw: &Value, kind: FieldKind) -> CoerceError {
    CoerceError {
        value: raw.to_string(),
        target: kind.type_name(),
    }
}
