//! Connection types for paginated fields
//!
//! A [`Connection`] is the materialized page of a field plus two derived
//! aggregates: `count` (edges in this page) and `total` (records matching the
//! query before pagination). Both are computed from the edges on every read.
//!
//! Usage: use the `connection_type!` macro to create type-specific GraphQL connections.

use std::ops::Deref;

use async_graphql::SimpleObject;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// A node that may know how many records matched the query it came from.
pub trait TotalCount {
    /// Total matching records, if the node carries it
    fn total_count(&self) -> Option<i64> {
        None
    }
}

/// A record decorated with the total matching count of its query.
#[derive(Debug, Clone, PartialEq)]
pub struct Counted<T> {
    record: T,
    total: Option<i64>,
}

impl<T> Counted<T> {
    pub fn new(record: T, total: Option<i64>) -> Self {
        Self { record, total }
    }

    /// A record with no total attached
    pub fn bare(record: T) -> Self {
        Self::new(record, None)
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn into_inner(self) -> T {
        self.record
    }
}

impl<T> Deref for Counted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T> TotalCount for Counted<T> {
    fn total_count(&self) -> Option<i64> {
        self.total
    }
}

/// Information about pagination in a connection
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// When paginating forwards, are there more items?
    pub has_next_page: bool,
    /// When paginating backwards, are there more items?
    pub has_previous_page: bool,
    /// Cursor of the first item in this page
    pub start_cursor: Option<String>,
    /// Cursor of the last item in this page
    pub end_cursor: Option<String>,
}

/// An edge in a connection, containing a node and cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<N> {
    /// The item at the end of the edge
    pub node: N,
    /// A cursor for pagination
    pub cursor: String,
}

/// A page of nodes with derived `count` and `total`.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection<N> {
    edges: Vec<Edge<N>>,
    offset: i64,
}

impl<N: TotalCount> Connection<N> {
    /// Wrap nodes whose first element sits at offset 0.
    pub fn assemble(nodes: Vec<N>) -> Self {
        Self::assemble_at(nodes, 0)
    }

    /// Wrap nodes whose first element sits at `offset` in the full result set.
    pub fn assemble_at(nodes: Vec<N>, offset: i64) -> Self {
        let edges = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| Edge {
                cursor: encode_cursor(offset + i as i64),
                node,
            })
            .collect();

        Self { edges, offset }
    }

    pub fn edges(&self) -> &[Edge<N>] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge<N>> {
        self.edges
    }

    /// Number of edges in this page
    pub fn count(&self) -> i64 {
        self.edges.len() as i64
    }

    /// Records matching the query before pagination.
    ///
    /// Read from the first node; falls back to `count` when the node has no
    /// usable total. An empty page is always 0.
    pub fn total(&self) -> i64 {
        match self.edges.first() {
            None => 0,
            Some(edge) => edge
                .node
                .total_count()
                .filter(|total| *total >= 0)
                .unwrap_or_else(|| self.count()),
        }
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            has_next_page: self.offset + self.count() < self.total(),
            has_previous_page: self.offset > 0,
            start_cursor: self.edges.first().map(|e| e.cursor.clone()),
            end_cursor: self.edges.last().map(|e| e.cursor.clone()),
        }
    }
}

/// Macro to define a GraphQL connection type for a specific record type
///
/// The connection wraps `Connection<Counted<$node_type>>` and exposes
/// `edges { node cursor }`, `count`, `total` and `pageInfo`.
///
/// Usage:
/// ```ignore
/// connection_type!(BookConnection, BookEdge, Book);
/// ```
#[macro_export]
macro_rules! connection_type {
    ($conn_name:ident, $edge_name:ident, $node_type:ty) => {
        /// Edge containing a node and cursor
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $edge_name {
            /// The item at the end of the edge
            pub node: $node_type,
            /// A cursor for pagination
            pub cursor: String,
        }

        /// Connection containing edges, page size and total matches
        #[derive(Debug, Clone)]
        pub struct $conn_name(
            pub $crate::graphql::Connection<$crate::graphql::Counted<$node_type>>,
        );

        #[async_graphql::Object]
        impl $conn_name {
            /// The edges in this page
            async fn edges(&self) -> Vec<$edge_name> {
                self.0
                    .edges()
                    .iter()
                    .map(|e| $edge_name {
                        node: e.node.record().clone(),
                        cursor: e.cursor.clone(),
                    })
                    .collect()
            }

            /// Number of items in this page
            async fn count(&self) -> i64 {
                self.0.count()
            }

            /// Number of items matching the query, ignoring pagination
            async fn total(&self) -> i64 {
                self.0.total()
            }

            /// Pagination information
            async fn page_info(&self) -> $crate::graphql::PageInfo {
                self.0.page_info()
            }
        }

        impl From<$crate::graphql::Connection<$crate::graphql::Counted<$node_type>>>
            for $conn_name
        {
            fn from(
                conn: $crate::graphql::Connection<$crate::graphql::Counted<$node_type>>,
            ) -> Self {
                Self(conn)
            }
        }
    };
}

/// Encode an offset as a cursor string
pub fn encode_cursor(offset: i64) -> String {
    BASE64.encode(format!("cursor:{}", offset))
}

/// Decode a cursor string to an offset
pub fn decode_cursor(cursor: &str) -> Result<i64, &'static str> {
    let decoded = BASE64.decode(cursor).map_err(|_| "invalid cursor format")?;

    let s = String::from_utf8(decoded).map_err(|_| "invalid cursor encoding")?;

    let Some(value) = s.strip_prefix("cursor:") else {
        return Err("invalid cursor prefix");
    };

    value.parse().map_err(|_| "invalid cursor value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Plain(&'static str);

    impl TotalCount for Plain {}

    #[test]
    fn test_cursor_roundtrip() {
        for offset in [0, 1, 100, 999999] {
            let cursor = encode_cursor(offset);
            assert_eq!(decode_cursor(&cursor), Ok(offset));
        }
        assert_eq!(decode_cursor("not base64!"), Err("invalid cursor format"));
    }

    #[test]
    fn test_empty_connection() {
        let conn = Connection::<Counted<Plain>>::assemble(Vec::new());
        assert_eq!(conn.count(), 0);
        assert_eq!(conn.total(), 0);
        assert_eq!(conn.page_info(), PageInfo::default());
    }

    #[test]
    fn test_single_node_without_total() {
        let conn = Connection::assemble(vec![Plain("only")]);
        assert_eq!(conn.count(), 1);
        assert_eq!(conn.total(), 1);
    }

    #[test]
    fn test_total_read_from_first_node() {
        let conn = Connection::assemble_at(
            vec![
                Counted::new(Plain("k"), Some(25)),
                Counted::new(Plain("l"), Some(25)),
            ],
            10,
        );
        assert_eq!(conn.count(), 2);
        assert_eq!(conn.total(), 25);
        assert_eq!(conn.edges()[0].cursor, encode_cursor(10));
        assert_eq!(conn.edges()[1].cursor, encode_cursor(11));

        let info = conn.page_info();
        assert!(info.has_next_page);
        assert!(info.has_previous_page);
        assert_eq!(info.start_cursor, Some(encode_cursor(10)));
        assert_eq!(info.end_cursor, Some(encode_cursor(11)));
    }

    #[test]
    fn test_missing_or_negative_total_falls_back_to_count() {
        let conn = Connection::assemble(vec![
            Counted::bare(Plain("a")),
            Counted::new(Plain("b"), Some(40)),
        ]);
        assert_eq!(conn.total(), 2);

        let conn = Connection::assemble(vec![Counted::new(Plain("a"), Some(-1))]);
        assert_eq!(conn.total(), 1);
    }

    #[test]
    fn test_last_page_has_no_next() {
        let nodes = (0..5).map(|_| Counted::new(Plain("x"), Some(25))).collect();
        let conn = Connection::assemble_at(nodes, 20);
        assert!(!conn.page_info().has_next_page);
    }
}
