//! Declarative entity type definitions. These are what callers write (or load
//! from JSON); `SchemaRegistry::build` turns them into reflected `EntityType`s.

use serde::{Deserialize, Serialize};

/// Storage kind of a non-relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Real,
    Text,
    Boolean,
    Json,
    /// A list of JSON scalars.
    Array,
}

/// Owning-side relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToOne,
    ForeignKey,
    ManyToMany,
}

/// What happens to owning rows when the row they point at is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    #[default]
    Cascade,
    SetNull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
    pub target: String,
    /// Only meaningful for foreign keys; one-to-one is always unique.
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub on_delete: OnDelete,
    /// Name of the reverse accessor on `target`.
    #[serde(default)]
    pub related_name: Option<String>,
}

impl RelationDef {
    pub fn foreign_key(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationKind::ForeignKey, target)
    }

    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationKind::OneToOne, target)
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationKind::ManyToMany, target)
    }

    fn new(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            unique: false,
            on_delete: OnDelete::Cascade,
            related_name: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.on_delete = on_delete;
        self
    }

    pub fn related_name(mut self, name: impl Into<String>) -> Self {
        self.related_name = Some(name.into());
        self
    }
}

/// A polymorphic reverse relation: `owner` rows point here through a
/// `(type_field, id_field)` pair of scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRelationDef {
    pub name: String,
    pub owner: String,
    pub type_field: String,
    pub id_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub relations: Vec<RelationDef>,
    #[serde(default)]
    pub generic_relations: Vec<GenericRelationDef>,
    #[serde(default)]
    pub unique_together: Vec<Vec<String>>,
    #[serde(default)]
    pub history: bool,
}

impl EntityTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
            generic_relations: Vec::new(),
            unique_together: Vec::new(),
            history: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            unique: false,
        });
        self
    }

    pub fn unique_field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            unique: true,
        });
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn foreign_key(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::foreign_key(name, target))
    }

    pub fn one_to_one(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::one_to_one(name, target))
    }

    pub fn many_to_many(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::many_to_many(name, target))
    }

    pub fn generic_relation(
        mut self,
        name: impl Into<String>,
        owner: impl Into<String>,
        type_field: impl Into<String>,
        id_field: impl Into<String>,
    ) -> Self {
        self.generic_relations.push(GenericRelationDef {
            name: name.into(),
            owner: owner.into(),
            type_field: type_field.into(),
            id_field: id_field.into(),
        });
        self
    }

    pub fn unique_together(mut self, fields: &[&str]) -> Self {
        self.unique_together
            .push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_history(mut self) -> Self {
        self.history = true;
        self
    }
}
