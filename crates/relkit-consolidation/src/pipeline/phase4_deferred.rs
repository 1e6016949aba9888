//! Phase 4: Deferred updates. Re-point far entities detached during the
//! merge, resolving both endpoints through the merged-target map.

use serde_json::Value;

use relkit_core::entity::{Entity, EntityRef};
use relkit_core::errors::{ConsolidationError, RelkitResult};
use relkit_core::traits::IEntityStorage;
use relkit_observability::events;

use super::phase3_merge::MergeState;

pub fn apply_deferred<S: IEntityStorage>(storage: &S, state: &MergeState) -> RelkitResult<usize> {
    for update in &state.deferred {
        let mut far = resolve(storage, state, &update.far)?;
        let target = resolve(storage, state, &update.target)?;
        far.set(&update.field, Value::from(target.pk));
        storage.save(&far)?;
    }
    events::deferred_updates_applied(state.deferred.len());
    Ok(state.deferred.len())
}

fn resolve<S: IEntityStorage>(
    storage: &S,
    state: &MergeState,
    entity: &EntityRef,
) -> RelkitResult<Entity> {
    let current = state.merged.resolve(entity);
    storage
        .get(&current.entity_type, current.pk)?
        .ok_or_else(|| {
            ConsolidationError::UnresolvedDeferredUpdate {
                entity: entity.clone(),
            }
            .into()
        })
}
