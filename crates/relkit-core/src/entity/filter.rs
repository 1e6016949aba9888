//! Query filters understood by every storage backend.

use serde_json::Value;

/// A single predicate on one field. Field names may be `id`/`pk`, scalar
/// fields, or concrete relation names (matched on the related pk).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals value. A `null` value matches NULL.
    Exact(String, Value),
    IsNull(String),
    /// Array field shares at least one element with the given values.
    Overlap(String, Vec<Value>),
    /// Field is one of the given values.
    In(String, Vec<Value>),
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Exact(f, _)
            | Condition::IsNull(f)
            | Condition::Overlap(f, _)
            | Condition::In(f, _) => f,
        }
    }
}

/// A conjunction (or, with `any`, a disjunction) of conditions.
///
/// An empty conjunction matches everything; an empty disjunction matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    pub any: bool,
}

impl Filter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            any: false,
        }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            any: true,
        }
    }

    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::and(vec![Condition::Exact(field.into(), value.into())])
    }

    pub fn pk_in(pks: &[i64]) -> Self {
        Self::and(vec![Condition::In(
            "id".to_string(),
            pks.iter().map(|pk| Value::from(*pk)).collect(),
        )])
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
