//! 4-phase merge pipeline orchestrator.
//!
//! Phase 1: Discovery → Phase 2: Cascade Gate → Phase 3: Merge →
//! Phase 4: Deferred Updates

pub mod phase1_discovery;
pub mod phase2_cascade_gate;
pub mod phase3_merge;
pub mod phase4_deferred;

use relkit_core::entity::Entity;
use relkit_core::errors::RelkitResult;
use relkit_core::traits::{IEntityStorage, ISchemaReflector};
use relkit_observability::events;
use tracing::info;

use crate::engine::MergeOptions;
use phase3_merge::{MergeContext, MergeState};

/// Run the full merge of `source` into `target` and return the survivor.
///
/// Callers wrap this in a storage transaction; nothing here rolls back.
pub fn run_pipeline<S: IEntityStorage, R: ISchemaReflector>(
    storage: &S,
    reflector: &R,
    source: &Entity,
    target: &Entity,
    options: &MergeOptions,
) -> RelkitResult<Entity> {
    // Phase 1: Discovery.
    let plan = phase1_discovery::discover(storage, reflector, source, target, options.max_depth)?;
    let deepest = plan.iter().map(|p| p.depth).max().unwrap_or(0);
    info!(pairs = plan.len(), deepest, "Phase 1: merge plan built");
    events::merge_plan_built(&source.reference(), &target.reference(), plan.len(), deepest);

    // Phase 2: Cascade Gate.
    phase2_cascade_gate::check_cascade(&plan, options.consolidate_related_uniques)?;

    // Phase 3: Merge.
    let ctx = MergeContext {
        storage,
        reflector,
        plan: &plan,
        endpoints: plan.endpoints(),
        overwrite: options.overwrite,
    };
    let mut state = MergeState::default();
    let mut merged = 0usize;
    for pair in plan.iter() {
        if phase3_merge::merge_pair(&ctx, &mut state, pair)?.is_some() {
            merged += 1;
        }
    }
    info!(merged, skipped = plan.len() - merged, "Phase 3: pairs merged");

    // Phase 4: Deferred Updates.
    let applied = phase4_deferred::apply_deferred(storage, &state)?;
    info!(applied, "Phase 4: deferred updates applied");

    let survivor_ref = state.merged.resolve(&target.reference());
    let survivor = phase1_discovery::fetch(storage, &survivor_ref)?;
    events::merge_completed(&source.reference(), &survivor_ref, merged);
    Ok(survivor)
}
