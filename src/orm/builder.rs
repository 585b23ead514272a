//! SQL query builder for the SQLite manager
//!
//! `SelectQuery` is the opaque query executed by [`SqliteManager`](super::SqliteManager).
//! Every query carries a `COUNT(*) OVER ()` column so the total number of
//! matching rows comes back with the page itself; SQLite evaluates window
//! aggregates before LIMIT/OFFSET, so the total ignores the page window.

use std::fmt;
use std::marker::PhantomData;

use super::context::QueryContext;
use super::filters::{Condition, compile_filters};
use super::manager::{EntityModel, QueryBuilder};
use super::spec::{OrderDirective, QuerySpec, Window};
use super::traits::{FromSqlRow, SqlValue, Table, quote_ident};
use crate::error::QuerySpecError;

/// Column alias carrying the total matching count on every row.
pub const TOTAL_COLUMN: &str = "__total";

/// A SELECT over table `E` with filtering, sorting and an optional window.
pub struct SelectQuery<E: Table> {
    where_clauses: Vec<String>,
    values: Vec<SqlValue>,
    order_clauses: Vec<String>,
    ordered_columns: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    with_total: bool,
    _phantom: PhantomData<fn() -> E>,
}

impl<E: Table> SelectQuery<E> {
    /// Create an unfiltered, unordered query over the whole table.
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            values: Vec::new(),
            order_clauses: Vec::new(),
            ordered_columns: Vec::new(),
            limit: None,
            offset: None,
            with_total: true,
            _phantom: PhantomData,
        }
    }

    /// Add a compiled filter condition (ANDed with the others).
    pub fn filter(mut self, condition: Condition) -> Self {
        self.where_clauses.push(condition.sql);
        self.values.extend(condition.values);
        self
    }

    /// Add a raw WHERE clause; `?` placeholders bind `values` in order.
    pub fn where_clause(mut self, condition: &str, values: Vec<SqlValue>) -> Self {
        self.where_clauses.push(condition.to_string());
        self.values.extend(values);
        self
    }

    /// Append an ordering directive after any existing ones.
    pub fn order_by(mut self, directive: &OrderDirective) -> Result<Self, QuerySpecError> {
        if !E::has_column(&directive.field) {
            return Err(QuerySpecError::UnknownField {
                table: E::TABLE_NAME,
                field: directive.field.clone(),
            });
        }
        self.order_clauses.push(format!(
            "{} {}",
            quote_ident(&directive.field),
            directive.direction.to_sql()
        ));
        self.ordered_columns.push(directive.field.clone());
        Ok(self)
    }

    /// Order by the primary key last unless it is already ordered on, so
    /// rows that tie on every directive still come back in a stable order.
    pub fn tie_break(mut self) -> Self {
        if !self.ordered_columns.iter().any(|c| c == E::PRIMARY_KEY) {
            self.order_clauses.push(format!("{} ASC", quote_ident(E::PRIMARY_KEY)));
            self.ordered_columns.push(E::PRIMARY_KEY.to_string());
        }
        self
    }

    /// Set limit directly.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set offset directly.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Restrict to a page window.
    pub fn window(self, window: Window) -> Self {
        self.limit(window.limit).offset(window.offset)
    }

    /// Skip the total column; consumers then fall back to the page size.
    pub fn without_total(mut self) -> Self {
        self.with_total = false;
        self
    }

    /// Offset of the first returned row within the full result set
    pub fn start_offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    /// Values to bind, in placeholder order
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Build the SQL query string.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT {}", E::select_list());

        if self.with_total {
            sql.push_str(&format!(", COUNT(*) OVER () AS {}", TOTAL_COLUMN));
        }

        sql.push_str(&format!(" FROM {}", quote_ident(E::TABLE_NAME)));

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if !self.order_clauses.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clauses.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
            }
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite only accepts OFFSET after a LIMIT
            (None, Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset));
            }
            (None, _) => {}
        }

        sql
    }
}

impl<E: Table> Default for SelectQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Table> Clone for SelectQuery<E> {
    fn clone(&self) -> Self {
        Self {
            where_clauses: self.where_clauses.clone(),
            values: self.values.clone(),
            order_clauses: self.order_clauses.clone(),
            ordered_columns: self.ordered_columns.clone(),
            limit: self.limit,
            offset: self.offset,
            with_total: self.with_total,
            _phantom: PhantomData,
        }
    }
}

impl<E: Table> fmt::Debug for SelectQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQuery")
            .field("sql", &self.to_sql())
            .field("values", &self.values)
            .finish()
    }
}

/// Build the default query for table `E` from a spec.
pub fn build_select<E: Table>(spec: &QuerySpec) -> Result<SelectQuery<E>, QuerySpecError> {
    let mut query = SelectQuery::<E>::new();

    for condition in compile_filters::<E>(&spec.filters)? {
        query = query.filter(condition);
    }

    for directive in &spec.order_by {
        query = query.order_by(directive)?;
    }
    query = query.tie_break();

    if let Some(window) = spec.window() {
        query = query.window(window);
    }

    Ok(query)
}

/// The default [`QueryBuilder`] for [`EntityModel`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlQueryBuilder;

impl<E: Table + FromSqlRow> QueryBuilder<EntityModel<E>> for SqlQueryBuilder {
    fn build(
        &self,
        _model: &EntityModel<E>,
        ctx: &QueryContext,
        spec: &QuerySpec,
    ) -> Result<SelectQuery<E>, QuerySpecError> {
        let query = build_select::<E>(spec)?;
        tracing::debug!(
            field = %ctx.field,
            viewer = ?ctx.viewer,
            table = E::TABLE_NAME,
            filters = spec.filters.len(),
            order_by = spec.order_by.len(),
            window = ?spec.window(),
            "Built default query"
        );
        Ok(query)
    }
}
