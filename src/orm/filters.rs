//! Default filter lookups for the SQLite query builder
//!
//! Filters arrive as a JSON object. Each entry is one of:
//! - `{"title": "Dune"}` - equality (`null` means IS NULL)
//! - `{"year__gte": 1990}` - field plus lookup suffix
//! - `{"year": {"gte": 1990, "lt": 2000}}` - nested lookups on one field
//!
//! All entries are combined with AND.

use serde_json::{Map, Value};

use super::traits::{SqlValue, Table, quote_ident};
use crate::error::QuerySpecError;

/// A parameterized WHERE fragment and the values it binds, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl Condition {
    fn new(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }
}

/// Supported lookup operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Contains,
    IContains,
    StartsWith,
    EndsWith,
    IsNull,
}

impl Lookup {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => Lookup::Eq,
            "ne" => Lookup::Ne,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "in" => Lookup::In,
            "not_in" => Lookup::NotIn,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "startswith" => Lookup::StartsWith,
            "endswith" => Lookup::EndsWith,
            "isnull" => Lookup::IsNull,
            _ => return None,
        })
    }
}

/// Compile a filters object into conditions against table `E`.
pub fn compile_filters<E: Table>(
    filters: &Map<String, Value>,
) -> Result<Vec<Condition>, QuerySpecError> {
    let mut conditions = Vec::new();

    for (key, value) in filters {
        match value {
            Value::Object(lookups) => {
                let field = resolve_field::<E>(key)?;
                for (name, operand) in lookups {
                    let lookup = Lookup::parse(name).ok_or_else(|| QuerySpecError::UnknownLookup {
                        field: key.clone(),
                        lookup: name.clone(),
                    })?;
                    conditions.push(compile_lookup(field, lookup, operand)?);
                }
            }
            _ => {
                let (field, lookup) = split_key::<E>(key)?;
                conditions.push(compile_lookup(field, lookup, value)?);
            }
        }
    }

    Ok(conditions)
}

/// Split `field__lookup` into a validated column and its lookup.
fn split_key<E: Table>(key: &str) -> Result<(&str, Lookup), QuerySpecError> {
    match key.rsplit_once("__") {
        Some((field, name)) => {
            let lookup = Lookup::parse(name).ok_or_else(|| QuerySpecError::UnknownLookup {
                field: field.to_string(),
                lookup: name.to_string(),
            })?;
            Ok((resolve_field::<E>(field)?, lookup))
        }
        None => Ok((resolve_field::<E>(key)?, Lookup::Eq)),
    }
}

/// Only declared columns may reach the SQL text.
fn resolve_field<E: Table>(field: &str) -> Result<&str, QuerySpecError> {
    if E::has_column(field) {
        Ok(field)
    } else {
        Err(QuerySpecError::UnknownField {
            table: E::TABLE_NAME,
            field: field.to_string(),
        })
    }
}

fn compile_lookup(field: &str, lookup: Lookup, operand: &Value) -> Result<Condition, QuerySpecError> {
    let column = quote_ident(field);
    let condition = match lookup {
        Lookup::Eq => match operand {
            Value::Null => Condition::new(format!("{} IS NULL", column), vec![]),
            _ => Condition::new(format!("{} = ?", column), vec![scalar(field, operand)?]),
        },
        Lookup::Ne => match operand {
            Value::Null => Condition::new(format!("{} IS NOT NULL", column), vec![]),
            _ => Condition::new(format!("{} != ?", column), vec![scalar(field, operand)?]),
        },
        Lookup::Lt => comparison(field, "<", operand)?,
        Lookup::Lte => comparison(field, "<=", operand)?,
        Lookup::Gt => comparison(field, ">", operand)?,
        Lookup::Gte => comparison(field, ">=", operand)?,
        Lookup::In | Lookup::NotIn => {
            let items = operand
                .as_array()
                .ok_or_else(|| invalid(field, "expected a list"))?;
            let values = items
                .iter()
                .map(|item| scalar(field, item))
                .collect::<Result<Vec<_>, _>>()?;

            if values.is_empty() {
                // Nothing is IN an empty list; everything is NOT IN it.
                let sql = if lookup == Lookup::In { "0 = 1" } else { "1 = 1" };
                Condition::new(sql, vec![])
            } else {
                let placeholders = vec!["?"; values.len()].join(", ");
                let op = if lookup == Lookup::In { "IN" } else { "NOT IN" };
                Condition::new(format!("{} {} ({})", column, op, placeholders), values)
            }
        }
        Lookup::Contains => glob(field, operand, |v| format!("*{}*", v))?,
        Lookup::StartsWith => glob(field, operand, |v| format!("{}*", v))?,
        Lookup::EndsWith => glob(field, operand, |v| format!("*{}", v))?,
        Lookup::IContains => {
            let text = text(field, operand)?;
            Condition::new(
                format!("{} LIKE ? ESCAPE '\\'", column),
                vec![SqlValue::String(format!("%{}%", escape_like(text)))],
            )
        }
        Lookup::IsNull => match operand {
            Value::Bool(true) => Condition::new(format!("{} IS NULL", column), vec![]),
            Value::Bool(false) => Condition::new(format!("{} IS NOT NULL", column), vec![]),
            _ => return Err(invalid(field, "isnull expects true or false")),
        },
    };

    Ok(condition)
}

fn comparison(field: &str, op: &str, operand: &Value) -> Result<Condition, QuerySpecError> {
    if operand.is_null() {
        return Err(invalid(field, "cannot compare against null"));
    }
    Ok(Condition::new(
        format!("{} {} ?", quote_ident(field), op),
        vec![scalar(field, operand)?],
    ))
}

/// Case-sensitive pattern match via GLOB.
fn glob(
    field: &str,
    operand: &Value,
    pattern: impl Fn(&str) -> String,
) -> Result<Condition, QuerySpecError> {
    let text = text(field, operand)?;
    Ok(Condition::new(
        format!("{} GLOB ?", quote_ident(field)),
        vec![SqlValue::String(pattern(&escape_glob(text)))],
    ))
}

fn text<'a>(field: &str, operand: &'a Value) -> Result<&'a str, QuerySpecError> {
    operand
        .as_str()
        .ok_or_else(|| invalid(field, "expected a string"))
}

fn scalar(field: &str, value: &Value) -> Result<SqlValue, QuerySpecError> {
    match value {
        Value::String(s) => Ok(SqlValue::String(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Null => Ok(SqlValue::Null),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Int(i)),
            None => n
                .as_f64()
                .map(SqlValue::Float)
                .ok_or_else(|| invalid(field, "number out of range")),
        },
        Value::Array(_) | Value::Object(_) => Err(invalid(field, "expected a scalar")),
    }
}

fn invalid(field: &str, reason: &str) -> QuerySpecError {
    QuerySpecError::InvalidFilterValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' | '?' | '[' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}
