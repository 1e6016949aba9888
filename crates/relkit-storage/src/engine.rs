//! StorageEngine: owns the connection and the schema, implements
//! IEntityStorage, and provisions tables at startup.

use std::path::Path;
use std::sync::Arc;

use relkit_core::config::StorageConfig;
use relkit_core::entity::{Entity, Filter, HistoryRecord, Values};
use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::schema::{Cardinality, SchemaRegistry};
use relkit_core::traits::IEntityStorage;

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{entity_crud, filter, fulltext, history_ops, relation_ops};
use crate::transaction::SavepointStack;

/// The main storage engine.
pub struct StorageEngine {
    pool: ConnectionPool,
    schema: Arc<SchemaRegistry>,
    savepoints: SavepointStack,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path, schema: Arc<SchemaRegistry>) -> RelkitResult<Self> {
        Self::open_with_config(path, schema, &StorageConfig::default())
    }

    pub fn open_with_config(
        path: &Path,
        schema: Arc<SchemaRegistry>,
        config: &StorageConfig,
    ) -> RelkitResult<Self> {
        let pool = ConnectionPool::open(path, config)?;
        Self::initialize(pool, schema)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory(schema: Arc<SchemaRegistry>) -> RelkitResult<Self> {
        let pool = ConnectionPool::open_in_memory(&StorageConfig::default())?;
        Self::initialize(pool, schema)
    }

    /// Run migrations and provision entity tables.
    fn initialize(pool: ConnectionPool, schema: Arc<SchemaRegistry>) -> RelkitResult<Self> {
        pool.writer
            .with_conn_sync(|conn| migrations::run_migrations(conn, &schema))?;
        tracing::debug!(
            entity_types = schema.types().len(),
            db_path = ?pool.db_path,
            "storage engine initialized"
        );
        Ok(Self {
            pool,
            schema,
            savepoints: SavepointStack::new(),
        })
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn schema_arc(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.schema)
    }

    /// Number of `atomic` blocks currently open.
    pub fn transaction_depth(&self) -> usize {
        self.savepoints.depth()
    }

    /// Total row count of a table (entity, link, or history table).
    pub fn table_row_count(&self, table: &str) -> RelkitResult<usize> {
        self.pool.writer.with_conn_sync(|conn| {
            let n: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", crate::quote(table)), [], |row| {
                    row.get(0)
                })
                .map_err(crate::map_sqlite_err)?;
            Ok(n as usize)
        })
    }
}

impl IEntityStorage for StorageEngine {
    fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    // --- CRUD ---

    fn get(&self, entity_type: &str, pk: i64) -> RelkitResult<Option<Entity>> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| entity_crud::get_entity(conn, entity_type, pk))
    }

    fn create(&self, entity_type: &str, values: &Values) -> RelkitResult<Entity> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| entity_crud::insert_entity(conn, entity_type, values))
    }

    fn save(&self, entity: &Entity) -> RelkitResult<()> {
        let entity_type = self.schema.entity_type(&entity.entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| entity_crud::update_entity(conn, entity_type, entity))
    }

    fn delete(&self, entity: &Entity) -> RelkitResult<()> {
        let entity_type = self.schema.entity_type(&entity.entity_type)?;
        self.pool.writer.with_conn_sync(|conn| {
            entity_crud::delete_entity(conn, &self.schema, entity_type, entity.pk)
        })
    }

    fn refresh(&self, entity: &mut Entity) -> RelkitResult<()> {
        match self.get(&entity.entity_type, entity.pk)? {
            Some(fresh) => {
                *entity = fresh;
                Ok(())
            }
            None => Err(RelkitError::EntityNotFound {
                entity_type: entity.entity_type.clone(),
                pk: entity.pk,
            }),
        }
    }

    // --- Relations ---

    fn related(&self, entity: &Entity, field: &str) -> RelkitResult<Vec<Entity>> {
        self.pool
            .writer
            .with_conn_sync(|conn| relation_ops::related(conn, &self.schema, entity, field))
    }

    fn set_many_to_many(&self, entity: &Entity, field: &str, pks: &[i64]) -> RelkitResult<()> {
        let field = self.schema.field(&entity.entity_type, field)?;
        if field.cardinality() != Some(Cardinality::ManyToMany) {
            return Err(RelkitError::ValidationError {
                reason: format!("'{}' on {} is not many-to-many", field.name, field.owner),
            });
        }
        self.pool
            .writer
            .with_conn_sync(|conn| relation_ops::set_many_to_many(conn, field, entity.pk, pks))
    }

    // --- History ---

    fn history(&self, entity_type: &str, pk: i64) -> RelkitResult<Vec<HistoryRecord>> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| history_ops::list(conn, entity_type, pk))
    }

    fn rewrite_history(&self, entity_type: &str, from_pk: i64, to_pk: i64) -> RelkitResult<usize> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| history_ops::rewrite(conn, entity_type, from_pk, to_pk))
    }

    // --- Query ---

    fn filter(&self, entity_type: &str, filter: &Filter) -> RelkitResult<Vec<Entity>> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| filter::select(conn, entity_type, filter))
    }

    fn count(&self, entity_type: &str, filter: &Filter) -> RelkitResult<usize> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| filter::count(conn, entity_type, filter))
    }

    fn pks(&self, entity_type: &str, filter: &Filter) -> RelkitResult<Vec<i64>> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| filter::pks(conn, entity_type, filter))
    }

    // --- Bulk ---

    fn update_where(
        &self,
        entity_type: &str,
        filter: &Filter,
        values: &Values,
    ) -> RelkitResult<usize> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool
            .writer
            .with_conn_sync(|conn| entity_crud::update_where(conn, entity_type, filter, values))
    }

    fn delete_where(&self, entity_type: &str, filter: &Filter) -> RelkitResult<usize> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool.writer.with_conn_sync(|conn| {
            entity_crud::delete_where(conn, &self.schema, entity_type, filter)
        })
    }

    // --- Search ---

    fn search_fulltext(
        &self,
        entity_type: &str,
        fields: &[&str],
        query: &str,
        filter: &Filter,
        limit: usize,
    ) -> RelkitResult<Vec<(Entity, f64)>> {
        let entity_type = self.schema.entity_type(entity_type)?;
        self.pool.writer.with_conn_sync(|conn| {
            fulltext::search(conn, entity_type, fields, query, filter, limit)
        })
    }

    // --- Transactions ---

    fn atomic<T, F>(&self, work: F) -> RelkitResult<T>
    where
        F: FnOnce() -> RelkitResult<T>,
    {
        let name = self
            .pool
            .writer
            .with_conn_sync(|conn| self.savepoints.begin(conn))?;

        match work() {
            Ok(value) => {
                self.pool
                    .writer
                    .with_conn_sync(|conn| self.savepoints.release(conn, &name))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self
                    .pool
                    .writer
                    .with_conn_sync(|conn| self.savepoints.rollback(conn, &name))
                {
                    tracing::warn!(savepoint = %name, error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
