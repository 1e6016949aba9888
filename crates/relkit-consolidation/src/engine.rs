//! ConsolidationEngine: validates the request, then runs the merge pipeline
//! inside one storage transaction.

use relkit_core::config::ConsolidationConfig;
use relkit_core::entity::Entity;
use relkit_core::errors::{ConsolidationError, RelkitResult};
use relkit_core::traits::{IEntityStorage, ISchemaReflector};
use relkit_observability::consolidation_span;

use crate::pipeline::{self, phase1_discovery};
use crate::plan::MergePlan;

/// Flags for one merge.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Source values replace non-null target values.
    pub overwrite: bool,
    /// Allow the merge to cascade into additional related pairs.
    pub consolidate_related_uniques: bool,
    pub max_depth: usize,
}

impl From<&ConsolidationConfig> for MergeOptions {
    fn from(config: &ConsolidationConfig) -> Self {
        Self {
            overwrite: config.overwrite,
            consolidate_related_uniques: config.consolidate_related_uniques,
            max_depth: config.max_depth,
        }
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::from(&ConsolidationConfig::default())
    }
}

/// The merge engine.
///
/// Borrows a storage gateway and a schema reflector; holds no state
/// between calls.
pub struct ConsolidationEngine<'a, S, R> {
    storage: &'a S,
    reflector: &'a R,
    config: ConsolidationConfig,
}

impl<'a, S: IEntityStorage, R: ISchemaReflector> ConsolidationEngine<'a, S, R> {
    pub fn new(storage: &'a S, reflector: &'a R) -> Self {
        Self {
            storage,
            reflector,
            config: ConsolidationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConsolidationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Build the merge plan without mutating anything.
    pub fn discover(&self, source: &Entity, target: &Entity) -> RelkitResult<MergePlan> {
        let (source, target) = self.load_pair(source, target)?;
        phase1_discovery::discover(
            self.storage,
            self.reflector,
            &source,
            &target,
            self.config.max_depth,
        )
    }

    /// Merge `source` into `target` with explicit flags. Returns the
    /// refreshed survivor. Every write happens in one transaction.
    pub fn consolidate_objects(
        &self,
        source: &Entity,
        target: &Entity,
        overwrite: bool,
        consolidate_related_uniques: bool,
    ) -> RelkitResult<Entity> {
        let options = MergeOptions {
            overwrite,
            consolidate_related_uniques,
            max_depth: self.config.max_depth,
        };
        self.consolidate_with(source, target, &options)
    }

    /// Merge using the configured defaults.
    pub fn consolidate(&self, source: &Entity, target: &Entity) -> RelkitResult<Entity> {
        self.consolidate_with(source, target, &MergeOptions::from(&self.config))
    }

    pub fn consolidate_with(
        &self,
        source: &Entity,
        target: &Entity,
        options: &MergeOptions,
    ) -> RelkitResult<Entity> {
        let span = consolidation_span!(source.reference(), target.reference());
        let _guard = span.enter();

        let (source, target) = self.load_pair(source, target)?;
        self.storage.atomic(|| {
            pipeline::run_pipeline(self.storage, self.reflector, &source, &target, options)
        })
    }

    /// Check types match and reload both sides from storage.
    fn load_pair(&self, source: &Entity, target: &Entity) -> RelkitResult<(Entity, Entity)> {
        if source.entity_type != target.entity_type {
            return Err(ConsolidationError::TypeMismatch {
                source_type: source.entity_type.clone(),
                target_type: target.entity_type.clone(),
            }
            .into());
        }
        let source = phase1_discovery::fetch(self.storage, &source.reference())?;
        let target = phase1_discovery::fetch(self.storage, &target.reference())?;
        Ok((source, target))
    }
}
