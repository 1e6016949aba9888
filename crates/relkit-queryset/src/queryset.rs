//! QuerySet: one entity type plus a filter, bound to a storage gateway.

use relkit_core::entity::{Condition, Entity, Filter, Values};
use relkit_core::errors::RelkitResult;
use relkit_core::schema::EntityType;
use relkit_core::traits::IEntityStorage;

use crate::chunking::{self, ChunkIter};
use crate::inspection::{self, DeleteInspection};
use crate::upsert::{self, UpsertOptions};

/// A lazily evaluated selection of entities of one type.
pub struct QuerySet<'a, S> {
    storage: &'a S,
    entity_type: String,
    filter: Filter,
}

impl<S> Clone for QuerySet<'_, S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            entity_type: self.entity_type.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<'a, S: IEntityStorage> QuerySet<'a, S> {
    /// Every entity of `entity_type`.
    pub fn all(storage: &'a S, entity_type: impl Into<String>) -> Self {
        Self::filtered(storage, entity_type, Filter::all())
    }

    pub fn filtered(storage: &'a S, entity_type: impl Into<String>, filter: Filter) -> Self {
        Self {
            storage,
            entity_type: entity_type.into(),
            filter,
        }
    }

    /// Narrow the selection with one more condition.
    ///
    /// A disjunctive filter is wrapped by evaluating it to pks first.
    pub fn with(self, condition: Condition) -> RelkitResult<Self> {
        let filter = if self.filter.any {
            Filter::pk_in(&self.pks()?).with(condition)
        } else {
            self.filter.clone().with(condition)
        };
        Ok(Self { filter, ..self })
    }

    /// Everything in this selection except `pk`.
    pub fn exclude_pk(self, pk: i64) -> RelkitResult<Self> {
        let pks: Vec<i64> = self.pks()?.into_iter().filter(|p| *p != pk).collect();
        Ok(Self {
            filter: Filter::pk_in(&pks),
            ..self
        })
    }

    pub fn storage(&self) -> &'a S {
        self.storage
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn model(&self) -> RelkitResult<&'a EntityType> {
        self.storage.schema().entity_type(&self.entity_type)
    }

    pub fn fetch(&self) -> RelkitResult<Vec<Entity>> {
        self.storage.filter(&self.entity_type, &self.filter)
    }

    pub fn count(&self) -> RelkitResult<usize> {
        self.storage.count(&self.entity_type, &self.filter)
    }

    pub fn pks(&self) -> RelkitResult<Vec<i64>> {
        self.storage.pks(&self.entity_type, &self.filter)
    }

    pub fn first(&self) -> RelkitResult<Option<Entity>> {
        Ok(self.fetch()?.into_iter().next())
    }

    // --- Upsert ---

    pub fn get_if_exists(
        &self,
        criteria: &Values,
        options: &UpsertOptions,
    ) -> RelkitResult<Option<Entity>> {
        upsert::get_if_exists(self, criteria, options)
    }

    pub fn create_or_update(
        &self,
        criteria: &Values,
        updates: Option<&Values>,
        options: &UpsertOptions,
    ) -> RelkitResult<Entity> {
        upsert::create_or_update(self, criteria, updates, options)
    }

    // --- Chunking ---

    pub fn chunk(&self, size: usize, randomize: bool) -> RelkitResult<ChunkIter<'a, S>> {
        chunking::chunk(self, size, randomize)
    }

    pub fn sample(&self, size: usize) -> RelkitResult<Vec<Entity>> {
        chunking::sample(self, size)
    }

    pub fn chunk_update(&self, size: usize, values: &Values) -> RelkitResult<usize> {
        chunking::chunk_update(self, size, values)
    }

    pub fn chunk_delete(&self, size: usize) -> RelkitResult<usize> {
        chunking::chunk_delete(self, size)
    }

    // --- Inspection ---

    pub fn inspect_delete(&self) -> RelkitResult<DeleteInspection> {
        inspection::inspect_delete(self)
    }
}
