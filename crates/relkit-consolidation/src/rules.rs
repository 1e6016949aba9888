//! Field-level merge rules.

use serde_json::Value;

use relkit_core::entity::is_null_value;

/// Union of two array values: target's elements first, then source's
/// elements not already present. Duplicates are dropped. Two nulls stay null.
pub fn union_arrays(target: &Value, source: &Value) -> Value {
    if target.is_null() && source.is_null() {
        return Value::Null;
    }
    let mut out: Vec<Value> = Vec::new();
    for item in as_items(target).into_iter().chain(as_items(source)) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    Value::Array(out)
}

fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Whether a scalar should be taken from source: target is null (an empty
/// list counts as null) or `overwrite` is set. A null source never wins.
pub fn takes_source(target: &Value, source: &Value, overwrite: bool) -> bool {
    !is_null_value(source, true) && (overwrite || is_null_value(target, true))
}

/// Union of two pk lists keeping target order.
pub fn union_pks(target: &[i64], source: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(target.len() + source.len());
    for pk in target.iter().chain(source) {
        if !out.contains(pk) {
            out.push(*pk);
        }
    }
    out
}
