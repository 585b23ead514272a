//! Core traits for the ORM layer
//!
//! `Table` and `FromSqlRow` are implemented by `#[derive(Table)]` from
//! `orm-connections-macros`.

use sqlx::sqlite::SqliteRow;

/// Quote an identifier for SQLite, so column names like `order` are usable.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column definition for schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name in the database
    pub name: &'static str,
    /// SQLite storage class (TEXT, INTEGER, REAL, BLOB)
    pub sql_type: &'static str,
    /// Whether the column can be NULL
    pub nullable: bool,
    /// Whether this is the primary key
    pub is_primary_key: bool,
}

impl ColumnDef {
    /// Generate the column definition SQL
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(self.name), self.sql_type);

        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }

        if !self.nullable && !self.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        sql
    }
}

/// Metadata about a database table.
pub trait Table: Sized + Send + Sync + Unpin + 'static {
    /// The SQL table name (e.g., "books")
    const TABLE_NAME: &'static str;

    /// The primary key column, used as the final ordering tie-breaker
    const PRIMARY_KEY: &'static str;

    /// All column definitions for this table
    fn columns() -> &'static [ColumnDef];

    /// Whether `name` is a column of this table
    fn has_column(name: &str) -> bool {
        Self::columns().iter().any(|c| c.name == name)
    }

    /// Comma-separated column list for SELECT
    fn select_list() -> String {
        Self::columns()
            .iter()
            .map(|c| quote_ident(c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generate CREATE TABLE IF NOT EXISTS SQL
    fn create_table_sql() -> String {
        let column_defs: Vec<String> = Self::columns().iter().map(|c| c.to_sql()).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            quote_ident(Self::TABLE_NAME),
            column_defs.join(",\n  ")
        )
    }
}

/// Trait for decoding a database row into a record.
pub trait FromSqlRow: Sized {
    /// Decode a SQLite row into this record type
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Sort direction for ORDER BY clauses.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// Convert to SQL order string
    pub fn to_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Represents a SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl SqlValue {
    /// Bind this value as the next positional parameter
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_def_sql() {
        let pk = ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            nullable: false,
            is_primary_key: true,
        };
        let optional = ColumnDef {
            name: "year",
            sql_type: "INTEGER",
            nullable: true,
            is_primary_key: false,
        };
        let required = ColumnDef {
            name: "title",
            sql_type: "TEXT",
            nullable: false,
            is_primary_key: false,
        };

        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(pk.to_sql(), "\"id\" INTEGER PRIMARY KEY");
        assert_eq!(optional.to_sql(), "\"year\" INTEGER");
        assert_eq!(required.to_sql(), "\"title\" TEXT NOT NULL");
    }
}
