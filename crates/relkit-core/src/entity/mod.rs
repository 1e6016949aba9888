//! Entity model: a typed record with a stable integer primary key and a
//! JSON value map. Concrete one-to-one and many-to-one relations are stored
//! in the map under the relation name as the related pk (or null).

mod filter;
mod history;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use filter::{Condition, Filter};
pub use history::{HistoryChange, HistoryRecord};

/// Field values keyed by field or relation name.
pub type Values = serde_json::Map<String, Value>;

/// Name of the primary key column on every entity table.
pub const PK_FIELD: &str = "id";

/// Identity of an entity: its type plus primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub pk: i64,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, pk: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            pk,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.pk)
    }
}

/// A persisted record instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub pk: i64,
    pub values: Values,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, pk: i64, values: Values) -> Self {
        Self {
            entity_type: entity_type.into(),
            pk,
            values,
        }
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef::new(self.entity_type.clone(), self.pk)
    }

    /// Value of a field, `Null` when absent. `id` and `pk` resolve to the primary key.
    pub fn get(&self, field: &str) -> Value {
        if field == PK_FIELD || field == "pk" {
            return Value::from(self.pk);
        }
        self.values.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    /// Primary key held by a concrete one-to-one / many-to-one relation.
    pub fn related_pk(&self, relation: &str) -> Option<i64> {
        self.values.get(relation).and_then(Value::as_i64)
    }

    pub fn is_null(&self, field: &str) -> bool {
        self.get(field).is_null()
    }
}

/// True for `null`, and for an empty array when `empty_lists_are_null` is set.
pub fn is_null_value(value: &Value, empty_lists_are_null: bool) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => empty_lists_are_null && items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_resolves_pk_aliases() {
        let e = Entity::new("person", 7, Values::new());
        assert_eq!(e.get("id"), json!(7));
        assert_eq!(e.get("pk"), json!(7));
        assert!(e.get("missing").is_null());
    }

    #[test]
    fn empty_list_is_null_only_when_asked() {
        assert!(is_null_value(&json!([]), true));
        assert!(!is_null_value(&json!([]), false));
        assert!(!is_null_value(&json!([1]), true));
        assert!(is_null_value(&Value::Null, false));
    }

    #[test]
    fn entity_ref_displays_type_and_pk() {
        assert_eq!(EntityRef::new("team", 3).to_string(), "team#3");
    }
}
