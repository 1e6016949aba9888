//! The text compared for an entity: its listed fields joined by a space.

use serde_json::Value;

use relkit_core::entity::Entity;
use relkit_core::errors::{RelkitError, RelkitResult, SchemaError};
use relkit_core::schema::EntityType;

/// Search text of `entity`. Nulls contribute an empty string; non-text
/// values their JSON rendering.
pub fn search_text(entity: &Entity, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| match entity.get(field) {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every name in `fields` must be a stored field of `model`.
pub(crate) fn check_fields(model: &EntityType, fields: &[&str]) -> RelkitResult<()> {
    if fields.is_empty() {
        return Err(RelkitError::ValidationError {
            reason: format!("no fields given to compare on {}", model.name),
        });
    }
    for name in fields {
        let stored = model
            .field(name)
            .is_some_and(|f| !f.is_relation() && f.column_name().is_some());
        if !stored {
            return Err(SchemaError::UnknownField {
                entity_type: model.name.clone(),
                field: name.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
