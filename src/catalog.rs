//! Demo catalog: a `books` table exposed through connection and list fields

use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Json, Object, Result, Schema,
    SimpleObject,
};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::db::sync_schema;
use crate::graphql::{ConnectionField, Counted, FieldArgs, ListField};
use crate::orm::{EntityModel, QueryContext, SelectQuery, SqlValue, Table, quote_ident};

/// A book in the catalog
#[derive(Debug, Clone, PartialEq, SimpleObject, Table)]
#[table(name = "books")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

crate::connection_type!(BookConnection, BookEdge, Book);

pub type BookModel = EntityModel<Book>;

/// The GraphQL schema type
pub type CatalogSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Build the GraphQL schema over a pool whose `books` table is in sync
pub fn build_schema(pool: SqlitePool) -> CatalogSchema {
    let books = Arc::new(BookModel::new(pool));

    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(ConnectionField::new(books.clone()))
        .data(ListField::new(books))
        .finish()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Books matching `filters`, ordered by `orderBy`, one page at a time
    async fn books(
        &self,
        ctx: &Context<'_>,
        filters: Option<Json<Value>>,
        order_by: Option<Vec<String>>,
        page: Option<i32>,
        paginate_by: Option<i32>,
    ) -> Result<BookConnection> {
        let field = ctx.data_unchecked::<ConnectionField<BookModel>>();
        let args = FieldArgs::new(filters, order_by, page, paginate_by);

        let conn = field
            .resolve(|_, _, _| (), self, &QueryContext::from_graphql(ctx), &args)
            .await
            .map_err(|e| e.extend())?;

        Ok(conn.into())
    }

    /// All books by one author in publication order; pagination arguments are not applied
    async fn books_by_author(&self, ctx: &Context<'_>, author: String) -> Result<BookConnection> {
        let field = ctx.data_unchecked::<ConnectionField<BookModel>>();

        let conn = field
            .resolve(
                move |_, _, _| {
                    SelectQuery::<Book>::new()
                        .where_clause("author = ?", vec![SqlValue::String(author)])
                        .tie_break()
                },
                self,
                &QueryContext::from_graphql(ctx),
                &FieldArgs::default(),
            )
            .await
            .map_err(|e| e.extend())?;

        Ok(conn.into())
    }

    /// Up to `limit` books as a flat list, or every book when `limit` is omitted
    async fn book_list(&self, ctx: &Context<'_>, limit: Option<i32>) -> Result<Option<Vec<Book>>> {
        let field = ctx.data_unchecked::<ListField<BookModel>>();

        let records = field
            .resolve(
                move |_, _, _| {
                    let query = SelectQuery::<Book>::new().without_total().tie_break();
                    match limit {
                        Some(limit) => query.limit(i64::from(limit.max(0))),
                        None => query,
                    }
                },
                self,
                &QueryContext::from_graphql(ctx),
                &FieldArgs::default(),
            )
            .await
            .map_err(|e| e.extend())?;

        Ok(records.map(|books| books.into_iter().map(Counted::into_inner).collect()))
    }
}

const DEMO_BOOKS: &[(&str, &str, i32, &str)] = &[
    ("A Wizard of Earthsea", "Ursula K. Le Guin", 1968, "fantasy"),
    ("Dune", "Frank Herbert", 1965, "science fiction"),
    ("Foundation", "Isaac Asimov", 1951, "science fiction"),
    ("Hyperion", "Dan Simmons", 1989, "science fiction"),
    ("Kindred", "Octavia E. Butler", 1979, "science fiction"),
    ("Neuromancer", "William Gibson", 1984, "cyberpunk"),
    ("Parable of the Sower", "Octavia E. Butler", 1993, "science fiction"),
    ("Solaris", "Stanislaw Lem", 1961, "science fiction"),
    ("The Dispossessed", "Ursula K. Le Guin", 1974, "science fiction"),
    ("The Left Hand of Darkness", "Ursula K. Le Guin", 1969, "science fiction"),
    ("The Name of the Rose", "Umberto Eco", 1980, "mystery"),
    ("The Hobbit", "J. R. R. Tolkien", 1937, "fantasy"),
];

/// Create the `books` table and, if it is empty and `seed` is set, insert the demo rows.
pub async fn setup(pool: &SqlitePool, seed: bool) -> anyhow::Result<()> {
    sync_schema::<Book>(pool).await?;

    if !seed {
        return Ok(());
    }

    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(Book::TABLE_NAME));
    let (existing,): (i64,) = sqlx::query_as(&sql).fetch_one(pool).await?;
    if existing > 0 {
        return Ok(());
    }

    for (i, (title, author, year, genre)) in DEMO_BOOKS.iter().enumerate() {
        sqlx::query("INSERT INTO books (id, title, author, year, genre) VALUES (?, ?, ?, ?, ?)")
            .bind(i as i64 + 1)
            .bind(*title)
            .bind(*author)
            .bind(*year)
            .bind(*genre)
            .execute(pool)
            .await?;
    }

    tracing::info!(books = DEMO_BOOKS.len(), "Seeded demo catalog");
    Ok(())
}
