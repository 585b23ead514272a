//! Filterable, ordered, paginated GraphQL connection fields over async ORM collections
//!
//! A connection field takes `filters`, `orderBy`, `page` and `paginateBy`
//! arguments, builds a query for its model, executes it once through the
//! model's manager, and answers with a connection reporting both the page
//! size (`count`) and the number of matching records (`total`).
//!
//! - [`orm`] - query specs, the SQL builder, models and managers
//! - [`graphql`] - connection/list field resolvers and connection types
//! - [`catalog`] - a demo `books` schema wired through both

// Lets `#[derive(Table)]` output resolve inside this crate too.
extern crate self as orm_connections;

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod orm;

pub use error::{ExecutionError, FieldError, QuerySpecError};

#[doc(hidden)]
pub mod __private {
    pub use sqlx;
}
