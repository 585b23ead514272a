//! Database connection and schema synchronization
//!
//! Tables are created from `Table` column metadata:
//! - Creates missing tables
//! - Adds missing columns
//! - Does NOT handle column renames or type changes

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::orm::{Table, quote_ident};

/// Create a SQLite connection pool.
///
/// In-memory databases live and die with their connection, so they get a
/// single connection that is never recycled.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true);

    let pool = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
    }
    .context("Failed to connect to database")?;

    info!(url = %url, "Connected to database");
    Ok(pool)
}

/// Result of a schema sync operation
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub columns_added: Vec<(String, String)>, // (table, column)
}

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Get existing columns for a table
async fn get_table_columns(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(i32, String, String, i32, Option<String>, i32)> =
        sqlx::query_as(&format!("PRAGMA table_info({})", quote_ident(table_name)))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(_, name, _, _, _, _)| name).collect())
}

/// Create the table for `E`, or add any of its columns that are missing.
pub async fn sync_schema<E: Table>(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    if !table_exists(pool, E::TABLE_NAME).await? {
        let sql = E::create_table_sql();
        debug!(table = E::TABLE_NAME, sql = %sql, "Creating table");
        sqlx::query(&sql).execute(pool).await?;
        result.tables_created.push(E::TABLE_NAME.to_string());
        return Ok(result);
    }

    let existing = get_table_columns(pool, E::TABLE_NAME).await?;
    for column in E::columns() {
        if existing.iter().any(|c| c == column.name) {
            continue;
        }
        // SQLite can't add NOT NULL columns without a default
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote_ident(E::TABLE_NAME),
            quote_ident(column.name),
            column.sql_type
        );
        debug!(table = E::TABLE_NAME, column = column.name, "Adding column");
        sqlx::query(&sql).execute(pool).await?;
        result
            .columns_added
            .push((E::TABLE_NAME.to_string(), column.name.to_string()));
    }

    if !result.columns_added.is_empty() {
        info!(
            table = E::TABLE_NAME,
            columns = result.columns_added.len(),
            "Added missing columns"
        );
    }

    Ok(result)
}
