//! Error types for query construction and execution
//!
//! Errors are field-scoped: a failing connection or list field resolves to
//! `null` with an error entry, leaving sibling fields untouched.

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Invalid filter/order/page input, raised while building a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuerySpecError {
    #[error("page must be a positive integer, got {0}")]
    InvalidPage(i64),

    #[error("paginate_by must be a positive integer, got {0}")]
    InvalidPaginateBy(i64),

    #[error("filters must be an object mapping field paths to values")]
    InvalidFilters,

    #[error("unknown field `{field}` on `{table}`")]
    UnknownField { table: &'static str, field: String },

    #[error("unknown lookup `{lookup}` for field `{field}`")]
    UnknownLookup { field: String, lookup: String },

    #[error("unsupported value for `{field}`: {reason}")]
    InvalidFilterValue { field: String, reason: String },

    #[error("order_by entries must name a field")]
    EmptyOrderBy,
}

/// Failure reported by a manager while executing a query.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Error from resolving one connection or list field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Spec(#[from] QuerySpecError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl FieldError {
    /// Machine-readable code reported in the GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::Spec(_) => "QUERY_SPEC",
            FieldError::Execution(_) => "EXECUTION",
        }
    }
}

impl ErrorExtensions for FieldError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}
