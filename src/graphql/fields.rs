//! Connection and list field resolvers
//!
//! Both wrap a parent resolver. The parent runs synchronously and reports
//! what it produced through [`ResolverOutput`]:
//! - `NoResult`: build the default query from the field arguments
//! - `LazyQuery`: execute the parent's query as-is
//! - `Materialized`: use the records without touching the store
//!
//! ```rust,ignore
//! async fn books(&self, ctx: &Context<'_>, filters: Option<Json<Value>>, ...) -> Result<BookConnection> {
//!     let field = ctx.data_unchecked::<ConnectionField<EntityModel<Book>>>();
//!     let args = FieldArgs::new(filters, order_by, page, paginate_by);
//!     let conn = field
//!         .resolve(|_, _, _| (), self, &QueryContext::from_graphql(ctx), &args)
//!         .await
//!         .map_err(|e| e.extend())?;
//!     Ok(conn.into())
//! }
//! ```

use std::sync::Arc;

use async_graphql::Json;
use serde_json::Value;

use super::pagination::{Connection, TotalCount};
use crate::error::{FieldError, QuerySpecError};
use crate::orm::{
    Manager, Model, QueryBuilder, QueryContext, QueryOf, QuerySpec, RecordOf, SelectQuery,
    SqlQueryBuilder, Table,
};

/// Arguments shared by every connection field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldArgs {
    pub filters: Option<Value>,
    pub order_by: Option<Vec<String>>,
    pub page: Option<i32>,
    pub paginate_by: Option<i32>,
}

impl FieldArgs {
    /// Collect the GraphQL arguments of a connection field
    pub fn new(
        filters: Option<Json<Value>>,
        order_by: Option<Vec<String>>,
        page: Option<i32>,
        paginate_by: Option<i32>,
    ) -> Self {
        Self {
            filters: filters.map(|json| json.0),
            order_by,
            page,
            paginate_by,
        }
    }

    pub fn filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn order_by<I, S>(mut self, order_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = Some(order_by.into_iter().map(Into::into).collect());
        self
    }

    pub fn page(mut self, page: i32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn paginate_by(mut self, paginate_by: i32) -> Self {
        self.paginate_by = Some(paginate_by);
        self
    }

    /// Validate into a [`QuerySpec`]; absent arguments default to empty.
    pub fn to_spec(&self) -> Result<QuerySpec, QuerySpecError> {
        QuerySpec::new(
            self.filters.clone(),
            self.order_by.as_deref().unwrap_or_default(),
            self.page.map(i64::from),
            self.paginate_by.map(i64::from),
        )
    }
}

/// What a parent resolver produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverOutput<Q, R> {
    /// Nothing; the field builds its default query
    NoResult,
    /// An unexecuted query to run as-is
    LazyQuery(Q),
    /// Records that are already loaded
    Materialized(Vec<R>),
}

/// Values a parent resolver may return.
pub trait IntoResolverOutput<Q, R> {
    fn into_output(self) -> ResolverOutput<Q, R>;
}

impl<Q, R> IntoResolverOutput<Q, R> for ResolverOutput<Q, R> {
    fn into_output(self) -> ResolverOutput<Q, R> {
        self
    }
}

impl<Q, R> IntoResolverOutput<Q, R> for () {
    fn into_output(self) -> ResolverOutput<Q, R> {
        ResolverOutput::NoResult
    }
}

impl<Q, R, T: IntoResolverOutput<Q, R>> IntoResolverOutput<Q, R> for Option<T> {
    fn into_output(self) -> ResolverOutput<Q, R> {
        match self {
            Some(value) => value.into_output(),
            None => ResolverOutput::NoResult,
        }
    }
}

impl<Q, R> IntoResolverOutput<Q, R> for Vec<R> {
    fn into_output(self) -> ResolverOutput<Q, R> {
        ResolverOutput::Materialized(self)
    }
}

impl<E: Table, R> IntoResolverOutput<SelectQuery<E>, R> for SelectQuery<E> {
    fn into_output(self) -> ResolverOutput<SelectQuery<E>, R> {
        ResolverOutput::LazyQuery(self)
    }
}

/// Resolver for a filterable, ordered, paginated connection over model `M`.
pub struct ConnectionField<M, B = SqlQueryBuilder> {
    model: Arc<M>,
    builder: B,
}

impl<M> ConnectionField<M>
where
    M: Model,
    SqlQueryBuilder: QueryBuilder<M>,
{
    pub fn new(model: Arc<M>) -> Self {
        Self::with_builder(model, SqlQueryBuilder)
    }
}

impl<M, B> ConnectionField<M, B>
where
    M: Model,
    B: QueryBuilder<M>,
{
    pub fn with_builder(model: Arc<M>, builder: B) -> Self {
        Self { model, builder }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the parent resolver and materialize the field's records.
    ///
    /// Exactly one query is executed, unless the parent already returned
    /// records, in which case nothing is built or executed.
    pub async fn resolve_records<Root, F, T>(
        &self,
        parent: F,
        root: &Root,
        ctx: &QueryContext,
        args: &FieldArgs,
    ) -> Result<Vec<RecordOf<M>>, FieldError>
    where
        Root: ?Sized,
        F: FnOnce(&Root, &QueryContext, &FieldArgs) -> T,
        T: IntoResolverOutput<QueryOf<M>, RecordOf<M>>,
    {
        let (records, _) = self.fetch(parent, root, ctx, args).await?;
        Ok(records)
    }

    /// Resolve the field into a [`Connection`].
    pub async fn resolve<Root, F, T>(
        &self,
        parent: F,
        root: &Root,
        ctx: &QueryContext,
        args: &FieldArgs,
    ) -> Result<Connection<RecordOf<M>>, FieldError>
    where
        Root: ?Sized,
        F: FnOnce(&Root, &QueryContext, &FieldArgs) -> T,
        T: IntoResolverOutput<QueryOf<M>, RecordOf<M>>,
        RecordOf<M>: TotalCount,
    {
        let (records, offset) = self.fetch(parent, root, ctx, args).await?;
        Ok(Connection::assemble_at(records, offset))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(field = %ctx.field))]
    async fn fetch<Root, F, T>(
        &self,
        parent: F,
        root: &Root,
        ctx: &QueryContext,
        args: &FieldArgs,
    ) -> Result<(Vec<RecordOf<M>>, i64), FieldError>
    where
        Root: ?Sized,
        F: FnOnce(&Root, &QueryContext, &FieldArgs) -> T,
        T: IntoResolverOutput<QueryOf<M>, RecordOf<M>>,
    {
        let query = match parent(root, ctx, args).into_output() {
            ResolverOutput::Materialized(records) => {
                tracing::debug!(records = records.len(), "Parent resolver returned records");
                return Ok((records, 0));
            }
            ResolverOutput::LazyQuery(query) => {
                tracing::debug!("Parent resolver returned a query");
                query
            }
            ResolverOutput::NoResult => {
                let spec = args.to_spec()?;
                self.builder.build(&self.model, ctx, &spec)?
            }
        };

        let manager = self.model.manager();
        let offset = manager.start_offset(&query);
        let records = manager.execute(query).await?;
        Ok((records, offset))
    }
}

/// Resolver for a flat list field: no filtering, ordering or pagination.
pub struct ListField<M> {
    model: Arc<M>,
}

impl<M: Model> ListField<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    /// Execute a query returned by the parent, or pass its records through.
    ///
    /// A parent that returns nothing resolves to `None`.
    #[tracing::instrument(level = "debug", skip_all, fields(field = %ctx.field))]
    pub async fn resolve<Root, F, T>(
        &self,
        parent: F,
        root: &Root,
        ctx: &QueryContext,
        args: &FieldArgs,
    ) -> Result<Option<Vec<RecordOf<M>>>, FieldError>
    where
        Root: ?Sized,
        F: FnOnce(&Root, &QueryContext, &FieldArgs) -> T,
        T: IntoResolverOutput<QueryOf<M>, RecordOf<M>>,
    {
        match parent(root, ctx, args).into_output() {
            ResolverOutput::NoResult => Ok(None),
            ResolverOutput::Materialized(records) => Ok(Some(records)),
            ResolverOutput::LazyQuery(query) => {
                Ok(Some(self.model.manager().execute(query).await?))
            }
        }
    }
}
