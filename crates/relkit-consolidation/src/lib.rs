//! # relkit-consolidation
//!
//! Merges one entity into another of the same type. Discovery walks the
//! schema for unique-constraint conflicts and builds a dependency-ordered
//! plan; the executor collapses each pair inside one storage transaction.
//!
//! Pipeline: discovery → cascade gate → pairwise merge → deferred updates.

pub mod engine;
pub mod pipeline;
pub mod plan;
pub mod rules;

pub use engine::{ConsolidationEngine, MergeOptions};
pub use plan::{DeferredUpdate, MergePair, MergePlan, MergedMap};
