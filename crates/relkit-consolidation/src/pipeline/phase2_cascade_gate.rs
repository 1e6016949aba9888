//! Phase 2: Cascade gate. A plan that needs more than the requested pair is
//! refused unless the caller opted into consolidating related uniques.

use relkit_core::errors::{ConsolidationError, RelkitResult};
use relkit_observability::events;

use crate::plan::MergePlan;

pub fn check_cascade(plan: &MergePlan, consolidate_related_uniques: bool) -> RelkitResult<()> {
    if plan.len() <= 1 || consolidate_related_uniques {
        return Ok(());
    }
    let additional_pairs = plan.additional_pairs();
    if let Some(requested) = plan.requested() {
        events::cascade_rejected(&requested.source, &requested.target, additional_pairs.len());
    }
    Err(ConsolidationError::ConsolidationCascade { additional_pairs }.into())
}
