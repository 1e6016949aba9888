//! Reflected schema metadata, computed once when the registry is built.

mod definition;
mod registry;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use definition::{
    EntityTypeDef, FieldDef, GenericRelationDef, OnDelete, RelationDef, RelationKind, ValueKind,
};
pub use registry::SchemaRegistry;

use crate::entity::PK_FIELD;

/// Relation cardinality as seen from the type that declares the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// Columns of a polymorphic link on the owning type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericLink {
    pub type_field: String,
    pub id_field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationInfo {
    pub cardinality: Cardinality,
    pub related_type: String,
    /// Stored on this type's table (owning side).
    pub concrete: bool,
    /// Field name on `related_type` that points back across this relation.
    pub remote_field: String,
    pub on_delete: OnDelete,
    /// Link table for many-to-many relations.
    pub through: Option<String>,
    pub generic: Option<GenericLink>,
}

/// One field of an entity type: primary key, scalar, or relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub owner: String,
    pub value_kind: Option<ValueKind>,
    pub relation: Option<RelationInfo>,
    pub unique: bool,
    pub primary_key: bool,
}

impl Field {
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    pub fn cardinality(&self) -> Option<Cardinality> {
        self.relation.as_ref().map(|r| r.cardinality)
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_self_relation(&self) -> bool {
        self.relation
            .as_ref()
            .is_some_and(|r| r.related_type == self.owner)
    }

    pub fn remote_field_name(&self) -> Option<&str> {
        self.relation.as_ref().map(|r| r.remote_field.as_str())
    }

    pub fn related_type(&self) -> Option<&str> {
        self.relation.as_ref().map(|r| r.related_type.as_str())
    }

    pub fn is_concrete(&self) -> bool {
        self.relation.as_ref().map_or(true, |r| r.concrete)
    }

    pub fn is_array(&self) -> bool {
        self.value_kind == Some(ValueKind::Array)
    }

    pub fn is_generic(&self) -> bool {
        self.relation.as_ref().is_some_and(|r| r.generic.is_some())
    }

    /// One-to-one or many-to-one, concrete or reverse.
    pub fn is_single_valued_relation(&self) -> bool {
        matches!(
            self.cardinality(),
            Some(Cardinality::OneToOne | Cardinality::ManyToOne)
        )
    }

    /// True for relations whose value lives in a column of this type's table.
    pub fn is_foreign_key_column(&self) -> bool {
        self.is_concrete() && self.is_single_valued_relation()
    }

    /// Column holding this field, if it is stored on this type's table.
    pub fn column_name(&self) -> Option<String> {
        if self.primary_key {
            return Some(PK_FIELD.to_string());
        }
        match &self.relation {
            None => Some(self.name.clone()),
            Some(_) if self.is_foreign_key_column() => Some(format!("{}_id", self.name)),
            Some(_) => None,
        }
    }
}

/// Reflected entity type.
#[derive(Debug, Clone)]
pub struct EntityType {
    pub name: String,
    pub fields: Vec<Field>,
    pub unique_together: Vec<Vec<String>>,
    pub history: bool,
    index: HashMap<String, usize>,
}

impl EntityType {
    pub(crate) fn new(
        name: String,
        fields: Vec<Field>,
        unique_together: Vec<Vec<String>>,
        history: bool,
    ) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            name,
            fields,
            unique_together,
            history,
            index,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        let name = if name == "pk" { PK_FIELD } else { name };
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Look a field up by name or by its `<relation>_id` attribute name.
    pub fn field_by_attname(&self, name: &str) -> Option<&Field> {
        self.field(name).or_else(|| {
            name.strip_suffix("_id")
                .and_then(|base| self.field(base))
                .filter(|f| f.is_foreign_key_column())
        })
    }

    pub fn table_name(&self) -> &str {
        &self.name
    }

    pub fn history_table(&self) -> String {
        format!("{}__history", self.name)
    }

    /// Fields with a column on this type's table, pk excluded.
    pub fn stored_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|f| !f.primary_key && f.column_name().is_some())
    }

    pub fn relations(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_relation())
    }
}
