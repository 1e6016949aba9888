//! Phase 1: Discovery. Walk the schema from the requested pair and collect
//! every related pair that must be merged first to keep unique constraints
//! satisfied, then order the plan deepest-first.

use std::collections::HashSet;

use relkit_core::entity::{Entity, EntityRef};
use relkit_core::errors::{ConsolidationError, RelkitResult};
use relkit_core::schema::{Cardinality, Field};
use relkit_core::traits::{IEntityStorage, ISchemaReflector};

use crate::plan::{MergePair, MergePlan};

/// Build the merge plan for `source` into `target`.
///
/// Read-only. Pairs discovered transitively are checked for ambiguous
/// single-valued relations before the plan is returned.
pub fn discover<S: IEntityStorage, R: ISchemaReflector>(
    storage: &S,
    reflector: &R,
    source: &Entity,
    target: &Entity,
    max_depth: usize,
) -> RelkitResult<MergePlan> {
    let requested = MergePair::new(source.reference(), target.reference(), 0);

    let mut walk = Walk {
        storage,
        reflector,
        max_depth,
        seen: HashSet::from([(requested.source.clone(), requested.target.clone())]),
        found: Vec::new(),
    };
    walk.visit(source, target, 0)?;

    let mut pairs = walk.found;
    // Stable: equal depths keep discovery order.
    pairs.sort_by(|a, b| b.depth.cmp(&a.depth));
    pairs.retain(|p| p.source != requested.source);
    pairs.push(requested.clone());
    let plan = MergePlan { pairs };

    let endpoints = plan.endpoints();
    for pair in plan.iter().filter(|p| p.depth > 0) {
        let pair_source = fetch(storage, &pair.source)?;
        let pair_target = fetch(storage, &pair.target)?;
        check_ambiguity(
            storage,
            reflector,
            &requested,
            &endpoints,
            &pair_source,
            &pair_target,
        )?;
    }
    Ok(plan)
}

struct Walk<'a, S, R> {
    storage: &'a S,
    reflector: &'a R,
    max_depth: usize,
    seen: HashSet<(EntityRef, EntityRef)>,
    found: Vec<MergePair>,
}

impl<S: IEntityStorage, R: ISchemaReflector> Walk<'_, S, R> {
    fn visit(&mut self, source: &Entity, target: &Entity, depth: usize) -> RelkitResult<()> {
        let reflector = self.reflector;
        for field in reflector.fields_of(&source.entity_type)? {
            let Some(rel) = &field.relation else { continue };
            if rel.generic.is_some() {
                continue;
            }
            match rel.cardinality {
                Cardinality::OneToOne | Cardinality::ManyToOne if field.is_unique() => {
                    let related_source = single_related(self.storage, source, field)?;
                    let related_target = single_related(self.storage, target, field)?;
                    if let (Some(rs), Some(rt)) = (related_source, related_target) {
                        self.push(rs, rt, depth + 1)?;
                    }
                }
                Cardinality::OneToMany => {
                    let Some(remote) = reflector.remote_field(field) else { continue };
                    let groups = conflict_groups(reflector, remote)?;
                    if groups.is_empty() {
                        continue;
                    }
                    let source_side = self.storage.related(source, &field.name)?;
                    if source_side.is_empty() {
                        continue;
                    }
                    let target_side = self.storage.related(target, &field.name)?;
                    for rt in &target_side {
                        for rs in &source_side {
                            if groups.iter().any(|others| agree_on(rs, rt, others)) {
                                self.push(rs.clone(), rt.clone(), depth + 1)?;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn push(&mut self, source: Entity, target: Entity, depth: usize) -> RelkitResult<()> {
        let key = (source.reference(), target.reference());
        if key.0 == key.1
            || self.seen.contains(&key)
            || self.seen.contains(&(key.1.clone(), key.0.clone()))
        {
            return Ok(());
        }
        if depth > self.max_depth {
            return Err(ConsolidationError::DepthExceeded {
                max_depth: self.max_depth,
            }
            .into());
        }
        tracing::debug!(source = %key.0, target = %key.1, depth, "conflict pair discovered");
        self.seen.insert(key.clone());
        self.found.push(MergePair::new(key.0, key.1, depth));
        self.visit(&source, &target, depth)
    }
}

/// For a reverse relation whose far side is `remote`, the sets of other
/// far-side fields that, together with `remote`, must be unique. An empty
/// set means `remote` is unique on its own. No groups means no conflicts.
fn conflict_groups<R: ISchemaReflector>(
    reflector: &R,
    remote: &Field,
) -> RelkitResult<Vec<Vec<String>>> {
    if remote.is_unique() {
        return Ok(vec![Vec::new()]);
    }
    Ok(reflector
        .composite_unique_field_groups(&remote.owner)?
        .iter()
        .filter(|group| group.iter().any(|name| *name == remote.name))
        .map(|group| {
            group
                .iter()
                .filter(|name| **name != remote.name)
                .cloned()
                .collect()
        })
        .collect())
}

/// Both entities carry the same non-null value on every field in `others`.
fn agree_on(a: &Entity, b: &Entity, others: &[String]) -> bool {
    others.iter().all(|name| {
        let value = a.get(name);
        !value.is_null() && value == b.get(name)
    })
}

/// The entity on the far side of a single-valued relation, if any.
pub(crate) fn single_related<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    field: &Field,
) -> RelkitResult<Option<Entity>> {
    if field.is_concrete() && entity.related_pk(&field.name).is_none() {
        return Ok(None);
    }
    Ok(storage.related(entity, &field.name)?.into_iter().next())
}

/// Reference held by a single-valued relation, concrete or reverse.
fn related_ref<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    field: &Field,
) -> RelkitResult<Option<EntityRef>> {
    if field.is_concrete() {
        let related_type = field.related_type().unwrap_or_default();
        return Ok(entity
            .related_pk(&field.name)
            .map(|pk| EntityRef::new(related_type, pk)));
    }
    Ok(single_related(storage, entity, field)?.map(|e| e.reference()))
}

/// Fail if a one-to-one or many-to-one relation differs between the two
/// sides and either side's value is not an endpoint of a queued pair.
/// A null value is never an endpoint.
pub fn check_ambiguity<S: IEntityStorage, R: ISchemaReflector>(
    storage: &S,
    reflector: &R,
    requested: &MergePair,
    endpoints: &HashSet<EntityRef>,
    source: &Entity,
    target: &Entity,
) -> RelkitResult<()> {
    let queued = |value: &Option<EntityRef>| value.as_ref().is_some_and(|r| endpoints.contains(r));

    for field in reflector.fields_of(&source.entity_type)? {
        if !field.is_single_valued_relation() || field.is_generic() {
            continue;
        }
        let source_value = related_ref(storage, source, field)?;
        let target_value = related_ref(storage, target, field)?;
        if source_value != target_value && (!queued(&source_value) || !queued(&target_value)) {
            return Err(ConsolidationError::AmbiguousConsolidation {
                merge_source: source.reference(),
                merge_target: target.reference(),
                requested_source: requested.source.clone(),
                requested_target: requested.target.clone(),
                relation: field.name.clone(),
                source_value,
                target_value,
            }
            .into());
        }
    }
    Ok(())
}

/// Load an entity by reference, failing if it no longer exists.
pub(crate) fn fetch<S: IEntityStorage>(storage: &S, entity: &EntityRef) -> RelkitResult<Entity> {
    storage
        .get(&entity.entity_type, entity.pk)?
        .ok_or_else(|| {
            ConsolidationError::MissingEntity {
                entity: entity.clone(),
            }
            .into()
        })
}
