use crate::entity::{Entity, Filter, HistoryRecord, Values};
use crate::errors::RelkitResult;
use crate::schema::SchemaRegistry;

/// Persistence gateway: CRUD + relations + history + bulk + search + transactions.
pub trait IEntityStorage {
    /// Schema the storage was provisioned with.
    fn schema(&self) -> &SchemaRegistry;

    // --- CRUD ---
    fn get(&self, entity_type: &str, pk: i64) -> RelkitResult<Option<Entity>>;
    /// Insert a new row. Unknown keys are rejected; callers filter first.
    fn create(&self, entity_type: &str, values: &Values) -> RelkitResult<Entity>;
    /// Write every stored field of `entity` back to its row.
    fn save(&self, entity: &Entity) -> RelkitResult<()>;
    fn delete(&self, entity: &Entity) -> RelkitResult<()>;
    /// Reload `entity` from storage in place.
    fn refresh(&self, entity: &mut Entity) -> RelkitResult<()>;

    // --- Relations ---
    /// Entities reachable through any relation field of `entity`.
    fn related(&self, entity: &Entity, field: &str) -> RelkitResult<Vec<Entity>>;
    /// Replace the link set of a many-to-many field.
    fn set_many_to_many(&self, entity: &Entity, field: &str, pks: &[i64]) -> RelkitResult<()>;

    // --- History ---
    fn history(&self, entity_type: &str, pk: i64) -> RelkitResult<Vec<HistoryRecord>>;
    /// Re-point every history row of `from_pk` at `to_pk`. Returns rows touched.
    fn rewrite_history(&self, entity_type: &str, from_pk: i64, to_pk: i64)
        -> RelkitResult<usize>;

    // --- Query ---
    fn filter(&self, entity_type: &str, filter: &Filter) -> RelkitResult<Vec<Entity>>;
    fn count(&self, entity_type: &str, filter: &Filter) -> RelkitResult<usize>;
    fn pks(&self, entity_type: &str, filter: &Filter) -> RelkitResult<Vec<i64>>;

    // --- Bulk ---
    fn update_where(&self, entity_type: &str, filter: &Filter, values: &Values)
        -> RelkitResult<usize>;
    fn delete_where(&self, entity_type: &str, filter: &Filter) -> RelkitResult<usize>;

    // --- Search ---
    /// Full-text match over the concatenation of `fields`, best rank first.
    fn search_fulltext(
        &self,
        entity_type: &str,
        fields: &[&str],
        query: &str,
        filter: &Filter,
        limit: usize,
    ) -> RelkitResult<Vec<(Entity, f64)>>;

    // --- Transactions ---
    /// Run `work` atomically: every write inside commits together or not at all.
    /// Calls nest.
    fn atomic<T, F>(&self, work: F) -> RelkitResult<T>
    where
        F: FnOnce() -> RelkitResult<T>,
        Self: Sized;
}
