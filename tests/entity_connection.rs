//! Connection fields over a `#[derive(Table)]` entity, driven without a schema

use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::SqlitePool;

use orm_connections::FieldError;
use orm_connections::QuerySpecError;
use orm_connections::db::{self, SchemaSyncResult};
use orm_connections::graphql::{ConnectionField, Counted, FieldArgs, ListField};
use orm_connections::orm::{EntityModel, QueryContext, SelectQuery, SqlValue, Table};

#[derive(Debug, Clone, PartialEq, Table)]
#[table(name = "people", primary_key = "person_id")]
struct Person {
    person_id: i64,
    name: String,
    nickname: Option<String>,
}

const NAMES: [&str; 25] = [
    "Yara", "Bea", "Quinn", "Ada", "Mia", "Finn", "Uma", "Cy", "Nell", "Ivo", "Lev", "Rae", "Gus",
    "Kai", "Dot", "Ola", "Xan", "Eve", "Pia", "Hal", "Sol", "Tam", "Vic", "Wes", "Jo",
];

async fn people() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::sync_schema::<Person>(&pool).await.unwrap();

    for (i, name) in NAMES.iter().enumerate() {
        sqlx::query("INSERT INTO people (person_id, name) VALUES (?, ?)")
            .bind(i as i64 + 1)
            .bind(*name)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}

fn field(pool: &SqlitePool) -> ConnectionField<EntityModel<Person>> {
    ConnectionField::new(Arc::new(EntityModel::new(pool.clone())))
}

fn names(records: &[Counted<Person>]) -> Vec<&str> {
    records.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn test_derived_table_metadata() {
    assert_eq!(Person::TABLE_NAME, "people");
    assert_eq!(Person::PRIMARY_KEY, "person_id");

    let columns: Vec<_> = Person::columns()
        .iter()
        .map(|c| (c.name, c.sql_type, c.nullable, c.is_primary_key))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("person_id", "INTEGER", false, true),
            ("name", "TEXT", false, false),
            ("nickname", "TEXT", true, false),
        ]
    );
}

#[tokio::test]
async fn test_sync_schema_creates_then_adds_columns() {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    sqlx::query("CREATE TABLE people (person_id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();

    let result = db::sync_schema::<Person>(&pool).await.unwrap();
    assert_eq!(
        result,
        SchemaSyncResult {
            tables_created: vec![],
            columns_added: vec![("people".to_string(), "nickname".to_string())],
        }
    );

    let again = db::sync_schema::<Person>(&pool).await.unwrap();
    assert_eq!(again, SchemaSyncResult::default());
}

#[tokio::test]
async fn test_second_page_of_twenty_five() {
    let pool = people().await;
    let args = FieldArgs::default()
        .order_by(["name"])
        .page(2)
        .paginate_by(10);

    let conn = field(&pool)
        .resolve(|_, _, _| (), &(), &QueryContext::new("people"), &args)
        .await
        .unwrap();

    assert_eq!(conn.count(), 10);
    assert_eq!(conn.total(), 25);
    let page: Vec<&str> = conn.edges().iter().map(|e| e.node.name.as_str()).collect();
    assert_eq!(
        page,
        vec!["Kai", "Lev", "Mia", "Nell", "Ola", "Pia", "Quinn", "Rae", "Sol", "Tam"]
    );
}

#[tokio::test]
async fn test_total_is_stable_across_pages() {
    let pool = people().await;
    let field = field(&pool);
    let ctx = QueryContext::new("people");

    let mut seen = Vec::new();
    for page in 1..=3 {
        let args = FieldArgs::default()
            .order_by(["-name"])
            .page(page)
            .paginate_by(10);
        let conn = field.resolve(|_, _, _| (), &(), &ctx, &args).await.unwrap();

        assert_eq!(conn.total(), 25);
        seen.extend(conn.into_edges().into_iter().map(|e| e.node.into_inner().name));
    }

    let mut expected: Vec<String> = NAMES.iter().map(|n| n.to_string()).collect();
    expected.sort();
    expected.reverse();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_filtered_total() {
    let pool = people().await;
    let args = FieldArgs::default()
        .filters(json!({ "name__in": ["Ada", "Bea", "Cy", "Zed"] }))
        .order_by(["name"])
        .page(1)
        .paginate_by(2);

    let records = field(&pool)
        .resolve_records(|_, _, _| (), &(), &QueryContext::new("people"), &args)
        .await
        .unwrap();

    assert_eq!(names(&records), vec!["Ada", "Bea"]);
    assert_eq!(
        orm_connections::graphql::Connection::assemble(records).total(),
        3
    );
}

#[tokio::test]
async fn test_parent_query_overrides_field_arguments() {
    let pool = people().await;
    let args = FieldArgs::default().page(1).paginate_by(1);

    let conn = field(&pool)
        .resolve(
            |_, _, _| {
                SelectQuery::<Person>::new()
                    .where_clause("name LIKE ?", vec![SqlValue::String("%a%".into())])
                    .tie_break()
            },
            &(),
            &QueryContext::new("people"),
            &args,
        )
        .await
        .unwrap();

    // LIKE is case-insensitive: Yara Bea Ada Mia Uma Rae Kai Ola Xan Pia Hal Tam
    assert_eq!(conn.count(), 12);
    assert_eq!(conn.total(), 12);
}

#[tokio::test]
async fn test_materialized_parent_records() {
    let pool = people().await;
    let record = Counted::bare(Person {
        person_id: 99,
        name: "Zed".into(),
        nickname: None,
    });

    let conn = field(&pool)
        .resolve(
            move |_, _, _| vec![record],
            &(),
            &QueryContext::new("people"),
            &FieldArgs::default(),
        )
        .await
        .unwrap();

    assert_eq!(conn.count(), 1);
    assert_eq!(conn.total(), 1);
    assert_eq!(conn.edges()[0].node.name, "Zed");
}

#[tokio::test]
async fn test_empty_filter_result() {
    let pool = people().await;
    let args = FieldArgs::default().filters(json!({ "name": "Nobody" }));

    let conn = field(&pool)
        .resolve(|_, _, _| (), &(), &QueryContext::new("people"), &args)
        .await
        .unwrap();

    assert_eq!(conn.count(), 0);
    assert_eq!(conn.total(), 0);
}

#[tokio::test]
async fn test_spec_errors_surface_before_execution() {
    let pool = people().await;

    let err = field(&pool)
        .resolve(
            |_, _, _| (),
            &(),
            &QueryContext::new("people"),
            &FieldArgs::default().filters(json!({ "age__gt": 30 })),
        )
        .await
        .unwrap_err();
    assert_matches!(err, FieldError::Spec(QuerySpecError::UnknownField { .. }));

    let err = field(&pool)
        .resolve(
            |_, _, _| (),
            &(),
            &QueryContext::new("people"),
            &FieldArgs::default().page(1).paginate_by(0),
        )
        .await
        .unwrap_err();
    assert_matches!(err, FieldError::Spec(QuerySpecError::InvalidPaginateBy(0)));
}

#[tokio::test]
async fn test_execution_error_when_table_is_missing() {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();

    let err = field(&pool)
        .resolve(|_, _, _| (), &(), &QueryContext::new("people"), &FieldArgs::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "EXECUTION");
}

#[tokio::test]
async fn test_list_field_with_and_without_result() {
    let pool = people().await;
    let list = ListField::new(Arc::new(EntityModel::<Person>::new(pool)));
    let ctx = QueryContext::new("people");

    let none = list
        .resolve(|_, _, _| (), &(), &ctx, &FieldArgs::default())
        .await
        .unwrap();
    assert_eq!(none, None);

    let some = list
        .resolve(
            |_, _, _| SelectQuery::<Person>::new().without_total().tie_break().limit(2),
            &(),
            &ctx,
            &FieldArgs::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(names(&some), vec!["Yara", "Bea"]);
}

#[derive(Debug, Clone, PartialEq, Table)]
#[table(name = "group")]
struct Step {
    id: i64,
    order: i64,
    group: Option<String>,
}

#[tokio::test]
async fn test_reserved_word_identifiers() {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::sync_schema::<Step>(&pool).await.unwrap();

    for (id, order, group) in [(1, 3, "b"), (2, 1, "a"), (3, 2, "b"), (4, 5, "b")] {
        sqlx::query(r#"INSERT INTO "group" ("id", "order", "group") VALUES (?, ?, ?)"#)
            .bind(id)
            .bind(order)
            .bind(group)
            .execute(&pool)
            .await
            .unwrap();
    }

    let field = ConnectionField::new(Arc::new(EntityModel::<Step>::new(pool)));
    let args = FieldArgs::default()
        .filters(json!({ "group": "b", "order__lt": 5 }))
        .order_by(["-order"])
        .page(1)
        .paginate_by(1);

    let conn = field
        .resolve(|_, _, _| (), &(), &QueryContext::new("steps"), &args)
        .await
        .unwrap();

    assert_eq!(conn.count(), 1);
    assert_eq!(conn.total(), 2);
    assert_eq!(conn.edges()[0].node.id, 1);
    assert_eq!(conn.edges()[0].node.order, 3);
}
