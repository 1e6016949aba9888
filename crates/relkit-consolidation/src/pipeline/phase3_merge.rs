//! Phase 3: Merge. Collapse one pair: combine fields, redirect relations,
//! move history, then save the target and delete the source.

use std::collections::HashSet;

use serde_json::Value;

use relkit_core::entity::{Entity, EntityRef, PK_FIELD};
use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::schema::{Cardinality, Field};
use relkit_core::traits::{IEntityStorage, ISchemaReflector};
use relkit_observability::events;

use super::phase1_discovery::{check_ambiguity, fetch};
use crate::plan::{DeferredUpdate, MergePair, MergePlan, MergedMap};
use crate::rules;

/// Read-only inputs shared by every pair of one merge.
pub struct MergeContext<'a, S, R> {
    pub storage: &'a S,
    pub reflector: &'a R,
    pub plan: &'a MergePlan,
    pub endpoints: HashSet<EntityRef>,
    pub overwrite: bool,
}

/// Mutable state carried across pairs.
#[derive(Debug, Default)]
pub struct MergeState {
    pub merged: MergedMap,
    pub deferred: Vec<DeferredUpdate>,
}

/// Merge one pair. Returns the refreshed target, or `None` when both
/// endpoints already resolve to the same entity.
pub fn merge_pair<S: IEntityStorage, R: ISchemaReflector>(
    ctx: &MergeContext<'_, S, R>,
    state: &mut MergeState,
    pair: &MergePair,
) -> RelkitResult<Option<Entity>> {
    let source_ref = state.merged.resolve(&pair.source);
    let target_ref = state.merged.resolve(&pair.target);
    if source_ref == target_ref {
        tracing::debug!(
            source = %pair.source,
            target = %pair.target,
            "pair already merged, skipping"
        );
        return Ok(None);
    }

    let mut source = fetch(ctx.storage, &source_ref)?;
    let mut target = fetch(ctx.storage, &target_ref)?;

    if pair.depth > 0 {
        if let Some(requested) = ctx.plan.requested() {
            check_ambiguity(
                ctx.storage,
                ctx.reflector,
                requested,
                &ctx.endpoints,
                &source,
                &target,
            )?;
        }
    }

    for field in ctx.reflector.fields_of(&source.entity_type)? {
        if field.primary_key {
            continue;
        }
        match field.cardinality() {
            None => merge_value(ctx, field, &mut source, &mut target)?,
            Some(Cardinality::OneToOne | Cardinality::ManyToOne) if field.is_concrete() => {
                merge_concrete_relation(ctx, field, &mut source, &mut target)?
            }
            Some(Cardinality::ManyToMany) => merge_many_to_many(ctx, field, &source, &target)?,
            Some(_) if detaches(ctx.reflector, field) => {
                detach_unique_reverse(ctx, state, field, &source, &target)?
            }
            Some(_) => redirect_reverse(ctx, field, &source, &target)?,
        }
    }

    if ctx.reflector.entity_type(&source.entity_type)?.history {
        let moved = ctx
            .storage
            .rewrite_history(&source.entity_type, source.pk, target.pk)?;
        tracing::debug!(source = %source_ref, target = %target_ref, moved, "history rewritten");
    }

    match ctx.storage.save(&target) {
        Ok(()) => ctx.storage.delete(&source)?,
        Err(e) if e.is_unique_violation() => {
            events::unique_collision_retried(
                &target.entity_type,
                "delete_source_first",
                &e.to_string(),
            );
            ctx.storage.delete(&source)?;
            save_or_reinsert(ctx.storage, &target)?;
        }
        Err(e) => return Err(e),
    }
    ctx.storage.refresh(&mut target)?;

    state.merged.record(source_ref.clone(), target_ref.clone());
    events::pair_merged(&source_ref, &target_ref, pair.depth);
    Ok(Some(target))
}

/// Scalar and array fields.
fn merge_value<S: IEntityStorage, R>(
    ctx: &MergeContext<'_, S, R>,
    field: &Field,
    source: &mut Entity,
    target: &mut Entity,
) -> RelkitResult<()> {
    let source_value = source.get(&field.name);
    let target_value = target.get(&field.name);

    if field.is_array() {
        target.set(&field.name, rules::union_arrays(&target_value, &source_value));
        return Ok(());
    }
    if !rules::takes_source(&target_value, &source_value, ctx.overwrite)
        || source_value == target_value
    {
        return Ok(());
    }
    if field.is_unique() {
        source.set(&field.name, Value::Null);
        ctx.storage.save(source)?;
    }
    target.set(&field.name, source_value);
    Ok(())
}

/// One-to-one / many-to-one stored on this type.
fn merge_concrete_relation<S: IEntityStorage, R>(
    ctx: &MergeContext<'_, S, R>,
    field: &Field,
    source: &mut Entity,
    target: &mut Entity,
) -> RelkitResult<()> {
    let name = field.name.as_str();
    if field.is_self_relation() && target.related_pk(name) == Some(source.pk) {
        target.set(name, Value::from(target.pk));
    }

    let Some(source_pk) = source.related_pk(name) else {
        return Ok(());
    };
    if target.related_pk(name).is_some() && !ctx.overwrite {
        // Source still holds the unique value target keeps, e.g. two
        // entities pointing at each other through a one-to-one.
        if field.is_unique() && target.related_pk(name) == Some(source_pk) {
            source.set(name, Value::Null);
            ctx.storage.save(source)?;
        }
        return Ok(());
    }
    let value = if field.is_self_relation() && source_pk == source.pk {
        target.pk
    } else {
        source_pk
    };
    source.set(name, Value::Null);
    ctx.storage.save(source)?;
    target.set(name, Value::from(value));
    Ok(())
}

/// Reverse relations whose far field is unique: reverse one-to-one and the
/// reverse side of a unique foreign key.
fn detaches<R: ISchemaReflector>(reflector: &R, field: &Field) -> bool {
    !field.is_generic() && reflector.remote_field(field).is_some_and(|remote| remote.is_unique())
}

/// Unlink every far entity from source so deleting source cannot cascade
/// into it. The link is re-pointed at target in the deferred pass when
/// target has none of its own or `overwrite` is set.
fn detach_unique_reverse<S: IEntityStorage, R>(
    ctx: &MergeContext<'_, S, R>,
    state: &mut MergeState,
    field: &Field,
    source: &Entity,
    target: &Entity,
) -> RelkitResult<()> {
    let Some(remote) = field.remote_field_name() else {
        return Ok(());
    };
    let far_side: Vec<Entity> = ctx
        .storage
        .related(source, &field.name)?
        .into_iter()
        .filter(|far| !is_endpoint(far, source, target))
        .collect();
    if far_side.is_empty() {
        return Ok(());
    }

    let target_side = ctx.storage.related(target, &field.name)?;
    let repoint = target_side.is_empty() || ctx.overwrite;
    if ctx.overwrite {
        for mut existing in target_side {
            if is_endpoint(&existing, source, target) {
                continue;
            }
            existing.set(remote, Value::Null);
            ctx.storage.save(&existing)?;
        }
    }

    for mut far in far_side {
        far.set(remote, Value::Null);
        ctx.storage.save(&far)?;
        if repoint {
            state.deferred.push(DeferredUpdate {
                far: far.reference(),
                field: remote.to_string(),
                target: target.reference(),
            });
        }
    }
    Ok(())
}

/// Non-unique one-to-many, including generic relations: point every
/// entity related to source at target.
fn redirect_reverse<S: IEntityStorage, R>(
    ctx: &MergeContext<'_, S, R>,
    field: &Field,
    source: &Entity,
    target: &Entity,
) -> RelkitResult<()> {
    let Some(rel) = &field.relation else {
        return Ok(());
    };
    let column = match &rel.generic {
        Some(link) => link.id_field.as_str(),
        None => rel.remote_field.as_str(),
    };
    for mut far in ctx.storage.related(source, &field.name)? {
        // Self-references on source and target are handled with their own fields.
        if is_endpoint(&far, source, target) {
            continue;
        }
        far.set(column, Value::from(target.pk));
        ctx.storage.save(&far)?;
    }
    Ok(())
}

/// Target's link set becomes the union of both sides. On a self relation,
/// links to source become links to target.
fn merge_many_to_many<S: IEntityStorage, R>(
    ctx: &MergeContext<'_, S, R>,
    field: &Field,
    source: &Entity,
    target: &Entity,
) -> RelkitResult<()> {
    let remap = |pk: i64| {
        if field.is_self_relation() && pk == source.pk {
            target.pk
        } else {
            pk
        }
    };
    let pks_of = |entity: &Entity| -> RelkitResult<Vec<i64>> {
        Ok(ctx
            .storage
            .related(entity, &field.name)?
            .iter()
            .map(|e| remap(e.pk))
            .collect())
    };
    let source_pks = pks_of(source)?;
    if source_pks.is_empty() {
        return Ok(());
    }
    let target_pks = pks_of(target)?;
    ctx.storage
        .set_many_to_many(target, &field.name, &rules::union_pks(&target_pks, &source_pks))
}

/// Save `target` after source was deleted. A cascade from source may have
/// removed the row, in which case it is written back under the same pk.
fn save_or_reinsert<S: IEntityStorage>(storage: &S, target: &Entity) -> RelkitResult<()> {
    match storage.save(target) {
        Err(RelkitError::EntityNotFound { .. }) => {
            tracing::debug!(target = %target.reference(), "target removed by cascade, reinserting");
            let mut values = target.values.clone();
            values.insert(PK_FIELD.to_string(), Value::from(target.pk));
            storage.create(&target.entity_type, &values).map(|_| ())
        }
        other => other,
    }
}

fn is_endpoint(entity: &Entity, source: &Entity, target: &Entity) -> bool {
    let r = entity.reference();
    r == source.reference() || r == target.reference()
}
