//! GraphQL-facing half of the pipeline
//!
//! Field resolvers that run the ORM layer for a schema field, and the
//! connection types their results are assembled into.

pub mod fields;
pub mod pagination;

pub use fields::{ConnectionField, FieldArgs, IntoResolverOutput, ListField, ResolverOutput};
pub use pagination::{
    Connection, Counted, Edge, PageInfo, TotalCount, decode_cursor, encode_cursor,
};
