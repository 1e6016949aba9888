//! SchemaRegistry: validates definitions and precomputes forward and reverse
//! relation fields for every entity type.

use std::collections::{HashMap, HashSet};

use crate::entity::PK_FIELD;
use crate::errors::{RelkitResult, SchemaError};

use super::{
    Cardinality, EntityType, EntityTypeDef, Field, GenericLink, RelationInfo, RelationKind,
    ValueKind,
};

/// Explicit registry of entity types, keyed by logical type name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: Vec<EntityType>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build and validate a registry from type definitions.
    pub fn build(defs: Vec<EntityTypeDef>) -> RelkitResult<Self> {
        let mut index = HashMap::new();
        for (i, def) in defs.iter().enumerate() {
            validate_identifier(&def.name, &def.name, "entity type")?;
            if index.insert(def.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    entity_type: def.name.clone(),
                    field: def.name.clone(),
                }
                .into());
            }
        }

        let mut fields: Vec<Vec<Field>> = defs.iter().map(concrete_fields).collect();

        for def in &defs {
            for rel in &def.relations {
                let target = *index.get(&rel.target).ok_or_else(|| SchemaError::InvalidRelation {
                    entity_type: def.name.clone(),
                    relation: rel.name.clone(),
                    reason: format!("unknown target type '{}'", rel.target),
                })?;
                let (cardinality, default_name, unique) = match rel.kind {
                    RelationKind::OneToOne => (Cardinality::OneToOne, def.name.clone(), true),
                    RelationKind::ForeignKey => {
                        (Cardinality::OneToMany, format!("{}_set", def.name), false)
                    }
                    RelationKind::ManyToMany => {
                        (Cardinality::ManyToMany, format!("{}_set", def.name), false)
                    }
                };
                fields[target].push(Field {
                    name: rel.related_name.clone().unwrap_or(default_name),
                    owner: rel.target.clone(),
                    value_kind: None,
                    relation: Some(RelationInfo {
                        cardinality,
                        related_type: def.name.clone(),
                        concrete: false,
                        remote_field: rel.name.clone(),
                        on_delete: rel.on_delete,
                        through: through_table(&def.name, &rel.name, rel.kind),
                        generic: None,
                    }),
                    unique,
                    primary_key: false,
                });
            }

            for generic in &def.generic_relations {
                let owner = index
                    .get(&generic.owner)
                    .map(|&i| &defs[i])
                    .ok_or_else(|| SchemaError::InvalidRelation {
                        entity_type: def.name.clone(),
                        relation: generic.name.clone(),
                        reason: format!("unknown owner type '{}'", generic.owner),
                    })?;
                for (column, kind) in [
                    (&generic.type_field, ValueKind::Text),
                    (&generic.id_field, ValueKind::Integer),
                ] {
                    if !owner
                        .fields
                        .iter()
                        .any(|f| &f.name == column && f.kind == kind)
                    {
                        return Err(SchemaError::InvalidRelation {
                            entity_type: def.name.clone(),
                            relation: generic.name.clone(),
                            reason: format!(
                                "'{}' has no {:?} field '{}'",
                                owner.name, kind, column
                            ),
                        }
                        .into());
                    }
                }
                let i = index[&def.name];
                fields[i].push(Field {
                    name: generic.name.clone(),
                    owner: def.name.clone(),
                    value_kind: None,
                    relation: Some(RelationInfo {
                        cardinality: Cardinality::OneToMany,
                        related_type: generic.owner.clone(),
                        concrete: false,
                        remote_field: generic.id_field.clone(),
                        on_delete: super::OnDelete::Cascade,
                        through: None,
                        generic: Some(GenericLink {
                            type_field: generic.type_field.clone(),
                            id_field: generic.id_field.clone(),
                        }),
                    }),
                    unique: false,
                    primary_key: false,
                });
            }
        }

        let mut types = Vec::with_capacity(defs.len());
        for (def, fields) in defs.into_iter().zip(fields) {
            let mut seen = HashSet::new();
            for field in &fields {
                validate_identifier(&def.name, &field.name, "field")?;
                if !seen.insert(field.name.as_str()) || (field.name == "pk") {
                    return Err(SchemaError::DuplicateField {
                        entity_type: def.name.clone(),
                        field: field.name.clone(),
                    }
                    .into());
                }
            }
            let entity_type = EntityType::new(def.name, fields, def.unique_together, def.history);
            validate_unique_together(&entity_type)?;
            types.push(entity_type);
        }

        Ok(Self { types, index })
    }

    pub fn types(&self) -> &[EntityType] {
        &self.types
    }

    pub fn get(&self, name: &str) -> Option<&EntityType> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    pub fn entity_type(&self, name: &str) -> RelkitResult<&EntityType> {
        self.get(name).ok_or_else(|| {
            SchemaError::UnknownType {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn field(&self, entity_type: &str, field: &str) -> RelkitResult<&Field> {
        self.entity_type(entity_type)?.field(field).ok_or_else(|| {
            SchemaError::UnknownField {
                entity_type: entity_type.to_string(),
                field: field.to_string(),
            }
            .into()
        })
    }

    /// The field on the far side of a relation.
    pub fn remote_field(&self, field: &Field) -> Option<&Field> {
        let rel = field.relation.as_ref()?;
        if rel.generic.is_some() {
            return None;
        }
        self.get(&rel.related_type)?.field(&rel.remote_field)
    }

    /// Resolve a type by name, tolerating case, underscore, space, and dash variants.
    pub fn get_model(&self, name: &str) -> RelkitResult<&EntityType> {
        if let Some(t) = self.get(name) {
            return Ok(t);
        }
        let wanted = normalize_type_name(name);
        self.types
            .iter()
            .find(|t| normalize_type_name(&t.name) == wanted)
            .ok_or_else(|| {
                SchemaError::UnknownType {
                    name: name.to_string(),
                }
                .into()
            })
    }
}

fn normalize_type_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | ' ' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn through_table(owner: &str, relation: &str, kind: RelationKind) -> Option<String> {
    (kind == RelationKind::ManyToMany).then(|| format!("{owner}_{relation}"))
}

/// Primary key, scalar fields, then owning-side relations, in declaration order.
fn concrete_fields(def: &EntityTypeDef) -> Vec<Field> {
    let mut fields = vec![Field {
        name: PK_FIELD.to_string(),
        owner: def.name.clone(),
        value_kind: Some(ValueKind::Integer),
        relation: None,
        unique: true,
        primary_key: true,
    }];
    fields.extend(def.fields.iter().map(|f| Field {
        name: f.name.clone(),
        owner: def.name.clone(),
        value_kind: Some(f.kind),
        relation: None,
        unique: f.unique,
        primary_key: false,
    }));
    fields.extend(def.relations.iter().map(|rel| {
        let (cardinality, unique) = match rel.kind {
            RelationKind::OneToOne => (Cardinality::OneToOne, true),
            RelationKind::ForeignKey => (Cardinality::ManyToOne, rel.unique),
            RelationKind::ManyToMany => (Cardinality::ManyToMany, false),
        };
        let default_reverse = match rel.kind {
            RelationKind::OneToOne => def.name.clone(),
            _ => format!("{}_set", def.name),
        };
        Field {
            name: rel.name.clone(),
            owner: def.name.clone(),
            value_kind: None,
            relation: Some(RelationInfo {
                cardinality,
                related_type: rel.target.clone(),
                concrete: true,
                remote_field: rel.related_name.clone().unwrap_or(default_reverse),
                on_delete: rel.on_delete,
                through: through_table(&def.name, &rel.name, rel.kind),
                generic: None,
            }),
            unique,
            primary_key: false,
        }
    }));
    fields
}

fn validate_identifier(entity_type: &str, name: &str, what: &str) -> RelkitResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.contains("__");
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidConstraint {
            entity_type: entity_type.to_string(),
            reason: format!("invalid {what} name '{name}'"),
        }
        .into())
    }
}

fn validate_unique_together(entity_type: &EntityType) -> RelkitResult<()> {
    for group in &entity_type.unique_together {
        if group.is_empty() {
            return Err(SchemaError::InvalidConstraint {
                entity_type: entity_type.name.clone(),
                reason: "empty unique_together group".to_string(),
            }
            .into());
        }
        for name in group {
            let stored = entity_type
                .field(name)
                .is_some_and(|f| !f.primary_key && f.column_name().is_some());
            if !stored {
                return Err(SchemaError::InvalidConstraint {
                    entity_type: entity_type.name.clone(),
                    reason: format!("'{name}' in unique_together is not a stored field"),
                }
                .into());
            }
        }
    }
    Ok(())
}
