//! Delete-impact and related-object inspection.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use relkit_core::entity::{Entity, EntityRef, Filter};
use relkit_core::errors::RelkitResult;
use relkit_core::schema::{Cardinality, OnDelete};
use relkit_core::traits::IEntityStorage;

use crate::queryset::QuerySet;

/// Everything a delete would remove, computed without deleting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteInspection {
    /// Entity pks per type.
    pub entities: BTreeMap<String, BTreeSet<i64>>,
    /// `(source_id, target_id)` rows per many-to-many link table.
    pub links: BTreeMap<String, BTreeSet<(i64, i64)>>,
}

impl DeleteInspection {
    /// Row counts per entity type and per link table.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.entities
            .iter()
            .map(|(name, pks)| (name.clone(), pks.len()))
            .chain(self.links.iter().map(|(name, rows)| (name.clone(), rows.len())))
            .collect()
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.entities
            .get(&entity.entity_type)
            .is_some_and(|pks| pks.contains(&entity.pk))
    }

    /// Load the entities that would be deleted, per type.
    pub fn objects<S: IEntityStorage>(
        &self,
        storage: &S,
    ) -> RelkitResult<BTreeMap<String, Vec<Entity>>> {
        let mut out = BTreeMap::new();
        for (name, pks) in &self.entities {
            let pks: Vec<i64> = pks.iter().copied().collect();
            out.insert(name.clone(), storage.filter(name, &Filter::pk_in(&pks))?);
        }
        Ok(out)
    }
}

/// Cascade closure of deleting every entity in `queryset`.
///
/// Follows reverse relations whose delete rule is `Cascade` and generic
/// relations, transitively. `SetNull` relations keep their rows. Link rows of
/// every many-to-many relation touching a deleted entity are reported under
/// the link table name.
pub fn inspect_delete<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
) -> RelkitResult<DeleteInspection> {
    let storage = queryset.storage();
    let schema = storage.schema();
    let mut inspection = DeleteInspection::default();
    let mut queue: VecDeque<Entity> = queryset.fetch()?.into();
    for entity in &queue {
        collect(&mut inspection, entity);
    }

    while let Some(entity) = queue.pop_front() {
        let entity_type = schema.entity_type(&entity.entity_type)?;
        for field in entity_type.relations() {
            let Some(rel) = &field.relation else { continue };

            if rel.cardinality == Cardinality::ManyToMany {
                let Some(through) = &rel.through else { continue };
                let rows = inspection.links.entry(through.clone()).or_default();
                for far in storage.related(&entity, &field.name)? {
                    rows.insert(if rel.concrete {
                        (entity.pk, far.pk)
                    } else {
                        (far.pk, entity.pk)
                    });
                }
                continue;
            }

            let cascades =
                !rel.concrete && (rel.generic.is_some() || rel.on_delete == OnDelete::Cascade);
            if !cascades {
                continue;
            }
            for dependent in storage.related(&entity, &field.name)? {
                if collect(&mut inspection, &dependent) {
                    queue.push_back(dependent);
                }
            }
        }
    }

    inspection.links.retain(|_, rows| !rows.is_empty());
    Ok(inspection)
}

/// Record `entity`; false when it was already collected.
fn collect(inspection: &mut DeleteInspection, entity: &Entity) -> bool {
    inspection
        .entities
        .entry(entity.entity_type.clone())
        .or_default()
        .insert(entity.pk)
}

/// What one relation of an entity currently points at.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    Single(Option<Entity>),
    Many(Vec<Entity>),
}

impl Related {
    pub fn count(&self) -> usize {
        match self {
            Related::Single(entity) => usize::from(entity.is_some()),
            Related::Many(entities) => entities.len(),
        }
    }
}

/// Every relation of `entity` with its current value. Single-valued
/// relations map to the related entity, to-many relations to the list.
pub fn related_objects<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    nonzero_only: bool,
) -> RelkitResult<BTreeMap<String, Related>> {
    let entity_type = storage.schema().entity_type(&entity.entity_type)?;
    let mut out = BTreeMap::new();
    for field in entity_type.relations() {
        let related = storage.related(entity, &field.name)?;
        let value = if field.is_single_valued_relation() {
            Related::Single(related.into_iter().next())
        } else {
            Related::Many(related)
        };
        if nonzero_only && value.count() == 0 {
            continue;
        }
        out.insert(field.name.clone(), value);
    }
    Ok(out)
}

/// Like `related_objects`, but with counts. A single-valued relation counts 1
/// when set and 0 when empty.
pub fn related_object_counts<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    nonzero_only: bool,
) -> RelkitResult<BTreeMap<String, usize>> {
    Ok(related_objects(storage, entity, nonzero_only)?
        .into_iter()
        .map(|(name, related)| (name, related.count()))
        .collect())
}
