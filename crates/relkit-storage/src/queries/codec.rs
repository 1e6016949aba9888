//! Conversion between JSON field values and SQLite values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value;

use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::schema::{Field, ValueKind};

use crate::to_storage_err;

/// Encode a field value for binding.
pub fn to_sql(field: &Field, value: &Value) -> RelkitResult<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    let kind = if field.is_relation() {
        ValueKind::Integer
    } else {
        field.value_kind.unwrap_or(ValueKind::Integer)
    };
    let encoded = match kind {
        ValueKind::Integer => value.as_i64().map(SqlValue::Integer),
        ValueKind::Real => value.as_f64().map(SqlValue::Real),
        ValueKind::Text => value.as_str().map(|s| SqlValue::Text(s.to_string())),
        ValueKind::Boolean => value.as_bool().map(|b| SqlValue::Integer(b as i64)),
        ValueKind::Array if !value.is_array() => None,
        ValueKind::Json | ValueKind::Array => Some(SqlValue::Text(serde_json::to_string(value)?)),
    };
    encoded.ok_or_else(|| type_err(field, value))
}

/// Decode a column value.
pub fn from_sql(field: &Field, raw: ValueRef<'_>) -> RelkitResult<Value> {
    let kind = field.value_kind.filter(|_| !field.is_relation());
    Ok(match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if kind == Some(ValueKind::Boolean) => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| to_storage_err(e.to_string()))?;
            match kind {
                Some(ValueKind::Json | ValueKind::Array) => serde_json::from_str(text)?,
                _ => Value::String(text.to_string()),
            }
        }
        ValueRef::Blob(_) => {
            return Err(to_storage_err(format!(
                "unexpected blob in {}.{}",
                field.owner, field.name
            )))
        }
    })
}

/// Render a value as plain text for full-text and similarity matching.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

fn type_err(field: &Field, value: &Value) -> RelkitError {
    RelkitError::ValidationError {
        reason: format!(
            "{}.{} cannot store {}",
            field.owner,
            field.name,
            match value {
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                Value::String(_) => "a string",
                Value::Array(_) => "an array",
                Value::Object(_) => "an object",
                Value::Null => "null",
            }
        ),
    }
}
