//! Merge plan types: pairs, the ordered plan, the merged-target map, and
//! deferred relation updates.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use relkit_core::entity::EntityRef;

/// A (source, target) pair to collapse into `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MergePair {
    pub source: EntityRef,
    pub target: EntityRef,
    /// 0 for the requested pair, n for pairs found while resolving depth n-1.
    pub depth: usize,
}

impl MergePair {
    pub fn new(source: EntityRef, target: EntityRef, depth: usize) -> Self {
        Self {
            source,
            target,
            depth,
        }
    }
}

/// Pairs ordered deepest-first; the requested pair is always last.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergePlan {
    pub pairs: Vec<MergePair>,
}

impl MergePlan {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergePair> {
        self.pairs.iter()
    }

    /// The pair the caller asked for.
    pub fn requested(&self) -> Option<&MergePair> {
        self.pairs.last()
    }

    /// Every pair other than the requested one, in plan order.
    pub fn additional_pairs(&self) -> Vec<(EntityRef, EntityRef)> {
        let n = self.pairs.len().saturating_sub(1);
        self.pairs[..n]
            .iter()
            .map(|p| (p.source.clone(), p.target.clone()))
            .collect()
    }

    /// Every entity that is a source or target of some pair.
    pub fn endpoints(&self) -> HashSet<EntityRef> {
        self.pairs
            .iter()
            .flat_map(|p| [p.source.clone(), p.target.clone()])
            .collect()
    }
}

/// A relation write postponed until every pair has been merged:
/// set `far.field` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredUpdate {
    pub far: EntityRef,
    pub field: String,
    pub target: EntityRef,
}

/// Consumed source → surviving target. Resolution is transitive.
#[derive(Debug, Clone, Default)]
pub struct MergedMap {
    map: HashMap<EntityRef, EntityRef>,
}

impl MergedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, source: EntityRef, target: EntityRef) {
        self.map.insert(source, target);
    }

    /// Follow the chain of merges from `entity` to its current survivor.
    pub fn resolve(&self, entity: &EntityRef) -> EntityRef {
        let mut current = entity.clone();
        // A chain can never be longer than the map; the bound guards cycles.
        for _ in 0..=self.map.len() {
            match self.map.get(&current) {
                Some(next) if *next != current => current = next.clone(),
                _ => break,
            }
        }
        current
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.map.contains_key(entity)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
