//! Model descriptors and the managers that execute their queries

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::builder::{SelectQuery, TOTAL_COLUMN};
use super::context::QueryContext;
use super::spec::QuerySpec;
use super::traits::{FromSqlRow, Table};
use crate::error::{ExecutionError, QuerySpecError};
use crate::graphql::pagination::Counted;

/// Executes opaque queries against a store and materializes the results.
///
/// Failures are returned as-is; retries and timeouts belong to the
/// implementation, not to callers.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Unexecuted query understood by this manager
    type Query: Send;
    /// Materialized record type
    type Record: Send;

    async fn execute(&self, query: Self::Query) -> Result<Vec<Self::Record>, ExecutionError>;

    /// Position of the query's first row in its unsliced result set
    fn start_offset(&self, _query: &Self::Query) -> i64 {
        0
    }
}

/// Describes a queryable collection. Its only capability is its manager.
pub trait Model: Send + Sync {
    type Manager: Manager;

    fn manager(&self) -> &Self::Manager;
}

/// The opaque query type of a model
pub type QueryOf<M> = <<M as Model>::Manager as Manager>::Query;

/// The materialized record type of a model
pub type RecordOf<M> = <<M as Model>::Manager as Manager>::Record;

/// Turns a [`QuerySpec`] into a model's opaque query without executing it.
pub trait QueryBuilder<M: Model>: Send + Sync {
    fn build(
        &self,
        model: &M,
        ctx: &QueryContext,
        spec: &QuerySpec,
    ) -> Result<QueryOf<M>, QuerySpecError>;
}

/// Manager for table `E` backed by a SQLite pool.
pub struct SqliteManager<E> {
    pool: SqlitePool,
    _phantom: PhantomData<fn() -> E>,
}

impl<E> SqliteManager<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }
}

impl<E> Clone for SqliteManager<E> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

/// Read the total column; a missing, NULL or non-integer value counts as absent.
fn decode_total(row: &SqliteRow) -> Option<i64> {
    row.try_get::<Option<i64>, _>(TOTAL_COLUMN).ok().flatten()
}

#[async_trait]
impl<E: Table + FromSqlRow> Manager for SqliteManager<E> {
    type Query = SelectQuery<E>;
    type Record = Counted<E>;

    async fn execute(&self, query: SelectQuery<E>) -> Result<Vec<Counted<E>>, ExecutionError> {
        let sql = query.to_sql();
        tracing::debug!(sql = %sql, "Executing entity query");

        let mut q = sqlx::query(&sql);
        for value in query.values() {
            q = value.bind_to_query(q);
        }

        let rows = q.fetch_all(&self.pool).await?;
        tracing::debug!(table = E::TABLE_NAME, rows = rows.len(), "Entity query finished");

        rows.iter()
            .map(|row| -> Result<Counted<E>, ExecutionError> {
                Ok(Counted::new(E::from_row(row)?, decode_total(row)))
            })
            .collect()
    }

    fn start_offset(&self, query: &SelectQuery<E>) -> i64 {
        query.start_offset()
    }
}

/// Model descriptor for a table stored in SQLite.
pub struct EntityModel<E> {
    manager: SqliteManager<E>,
}

impl<E> EntityModel<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            manager: SqliteManager::new(pool),
        }
    }
}

impl<E> Clone for EntityModel<E> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

impl<E: Table + FromSqlRow> Model for EntityModel<E> {
    type Manager = SqliteManager<E>;

    fn manager(&self) -> &SqliteManager<E> {
        &self.manager
    }
}
