//! Field-map pruning and field-name lookups.

use relkit_core::entity::{is_null_value, Values};
use relkit_core::errors::RelkitResult;
use relkit_core::schema::{EntityType, Field};
use relkit_core::traits::ISchemaReflector;

/// Separator of joined lookups (`party__name`).
pub const JOIN_SEPARATOR: &str = "__";

/// Prune a value map.
///
/// Drops keys containing `__` when `drop_underscore_joins` is set, and null
/// values when `drop_nulls` is set. Empty arrays count as null under
/// `empty_lists_are_null`.
pub fn filter_field_dict(
    values: &Values,
    drop_nulls: bool,
    empty_lists_are_null: bool,
    drop_underscore_joins: bool,
) -> Values {
    values
        .iter()
        .filter(|(key, _)| !(drop_underscore_joins && key.contains(JOIN_SEPARATOR)))
        .filter(|(_, value)| !(drop_nulls && is_null_value(value, empty_lists_are_null)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// True when `field` names a field of `entity_type`, by name or `<relation>_id`.
pub fn field_exists<R: ISchemaReflector + ?Sized>(
    reflector: &R,
    entity_type: &str,
    field: &str,
) -> bool {
    reflector
        .entity_type(entity_type)
        .is_ok_and(|t| t.field_by_attname(field).is_some())
}

/// Every field name of `entity_type`: pk, scalars, relations in both
/// directions, and the `<relation>_id` attribute name of each foreign key column.
pub fn get_all_field_names<R: ISchemaReflector + ?Sized>(
    reflector: &R,
    entity_type: &str,
) -> RelkitResult<Vec<String>> {
    let fields = reflector.fields_of(entity_type)?;
    let mut names = Vec::with_capacity(fields.len() + 2);
    for field in fields {
        names.push(field.name.clone());
        if field.is_relation() && field.is_foreign_key_column() {
            names.push(attname(field));
        }
    }
    Ok(names)
}

/// The field a key may be written through on create or save.
pub(crate) fn assignable_field<'a>(entity_type: &'a EntityType, key: &str) -> Option<&'a Field> {
    entity_type
        .field_by_attname(key)
        .filter(|f| f.column_name().is_some())
}

fn attname(field: &Field) -> String {
    format!("{}_id", field.name)
}
