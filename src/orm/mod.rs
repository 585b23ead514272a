//! ORM Layer
//!
//! Storage-facing half of the pipeline: query specs, the builder that turns
//! them into executable queries, and the managers that run those queries.
//!
//! ```rust,ignore
//! use orm_connections::orm::{EntityModel, Manager, Model, QuerySpec, build_select};
//!
//! let model = EntityModel::<Book>::new(pool);
//! let spec = QuerySpec::new(None, &["title".to_string()], Some(1), Some(10))?;
//! let page = model.manager().execute(build_select::<Book>(&spec)?).await?;
//! ```

mod builder;
mod context;
pub mod filters;
mod manager;
mod spec;
mod traits;

pub use builder::*;
pub use context::{QueryContext, Viewer};
pub use manager::*;
pub use spec::*;
pub use traits::*;

pub use orm_connections_macros::Table;
