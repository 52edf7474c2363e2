// Field accessors for schema-less producer JSON.
//
// Producers are loosely typed: ids and source lines arrive as strings or
// numbers, and costs sometimes as numeric strings. These helpers accept the
// same coercions for every field so each parser states only which fields it
// requires.

use serde_json::{Map, Value};

use crate::Rejected;

pub(crate) type Object = Map<String, Value>;

pub(crate) fn as_object(value: &Value) -> Result<&Object, Rejected> {
    value.as_object().ok_or(Rejected::NotAnObject)
}

/// Present and non-null.
pub(crate) fn required<'a>(obj: &'a Object, field: &'static str) -> Result<&'a Value, Rejected> {
    match obj.get(field) {
        None => Err(Rejected::Missing(field)),
        Some(Value::Null) => Err(Rejected::Null(field)),
        Some(value) => Ok(value),
    }
}

pub(crate) fn required_string(obj: &Object, field: &'static str) -> Result<String, Rejected> {
    scalar_string(required(obj, field)?).ok_or(Rejected::WrongType(field))
}

/// Present, non-null and not the empty string.
pub(crate) fn non_empty_string(obj: &Object, field: &'static str) -> Result<String, Rejected> {
    let value = required_string(obj, field)?;
    if value.is_empty() {
        return Err(Rejected::Empty(field));
    }
    Ok(value)
}

pub(crate) fn optional_string(obj: &Object, field: &str) -> String {
    obj.get(field).and_then(scalar_string).unwrap_or_default()
}

pub(crate) fn required_f64(obj: &Object, field: &'static str) -> Result<f64, Rejected> {
    let value = required(obj, field)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or(Rejected::WrongType(field))
}

/// Integers, whole-number floats (`5.0`) and integer strings.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
