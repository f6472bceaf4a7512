use std::sync::Arc;

use rocket::tokio;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value};

use super::{Command, Filter, Order, QueryBackend, QueryResult, Row};
use crate::db::{self, DbPool};

/// SQLite-backed implementation of `QueryBackend`.
/// Wraps an r2d2 connection pool; statements run on the blocking pool.
pub struct SqliteBackend {
    pool: DbPool,
}

impl SqliteBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `path`, then migrate and seed it.
    pub fn open(path: &str) -> Result<Self, String> {
        let pool = db::init_pool_at(path)?;
        db::run_migrations(&pool).map_err(|e| e.to_string())?;
        db::seed_defaults(&pool).map_err(|e| e.to_string())?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Lazy opener used by the resolver for file-path bindings.
pub fn opener(path: String) -> super::resolver::Opener {
    Box::new(move || {
        let backend = SqliteBackend::open(&path)?;
        log::info!("Opened SQLite database at {}", path);
        Ok(Arc::new(backend) as Arc<dyn QueryBackend>)
    })
}

#[rocket::async_trait]
impl QueryBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, command: Command) -> Result<QueryResult, String> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&pool, command))
            .await
            .map_err(|e| e.to_string())?
    }
}

// ── Statement building ──────────────────────────────────────────

/// A SQL string plus its positional parameters.
struct Statement {
    sql: String,
    params: Vec<SqlValue>,
    query: bool,
}

fn check_identifier(name: &str) -> Result<&str, String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(format!("invalid column name: {:?}", name))
    }
}

/// SQL condition for `filter`, binding its value into `params`.
fn condition(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<Option<String>, String> {
    let (column, op, value) = match filter {
        Filter::All => return Ok(None),
        Filter::Eq { column, value } => (column, "=", value),
        // IS NOT so that NULL columns count as different
        Filter::NotEq { column, value } => (column, "IS NOT", value),
    };
    params.push(to_sql(value));
    Ok(Some(format!(
        "{} {} ?{}",
        check_identifier(column)?,
        op,
        params.len()
    )))
}

fn where_clause(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<String, String> {
    Ok(condition(filter, params)?
        .map(|c| format!(" WHERE {}", c))
        .unwrap_or_default())
}

fn order_clause(order: Order) -> &'static str {
    match order {
        Order::NewestFirst => " ORDER BY created_at DESC, id DESC",
        Order::OrderIndexThenNewest => " ORDER BY order_index ASC, created_at DESC, id DESC",
        Order::KeyAsc => " ORDER BY key ASC",
    }
}

fn columns_of(row: &Row) -> Result<(Vec<&str>, Vec<SqlValue>), String> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (column, value) in row {
        if column == "id" {
            continue;
        }
        columns.push(check_identifier(column)?);
        values.push(to_sql(value));
    }
    if columns.is_empty() {
        return Err("no columns to write".to_string());
    }
    Ok((columns, values))
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn build(command: &Command) -> Result<Statement, String> {
    let table = command.table().as_str();
    let mut params = Vec::new();

    let (sql, query) = match command {
        Command::Insert { row, .. } => {
            let (columns, values) = columns_of(row)?;
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders(values.len())
            );
            params = values;
            (sql, false)
        }
        Command::SelectAll { filter, order, .. } => {
            let clause = where_clause(filter, &mut params)?;
            (
                format!("SELECT * FROM {}{}{}", table, clause, order_clause(*order)),
                true,
            )
        }
        Command::SelectOne { id, .. } => {
            params.push(SqlValue::Integer(*id));
            (format!("SELECT * FROM {} WHERE id = ?1", table), true)
        }
        Command::SelectByKey { column, value, .. } => {
            params.push(to_sql(value));
            (
                format!(
                    "SELECT * FROM {} WHERE {} = ?1 LIMIT 1",
                    table,
                    check_identifier(column)?
                ),
                true,
            )
        }
        Command::Update {
            id, row, filter, ..
        } => {
            let (columns, values) = columns_of(row)?;
            let assignments: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{} = ?{}", c, i + 1))
                .collect();
            params = values;
            params.push(SqlValue::Integer(*id));
            let id_param = params.len();
            let guard = condition(filter, &mut params)?
                .map(|c| format!(" AND {}", c))
                .unwrap_or_default();
            (
                format!(
                    "UPDATE {} SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?{}{}",
                    table,
                    assignments.join(", "),
                    id_param,
                    guard
                ),
                false,
            )
        }
        Command::Delete { id, .. } => {
            params.push(SqlValue::Integer(*id));
            (format!("DELETE FROM {} WHERE id = ?1", table), false)
        }
        Command::Count { filter, .. } => {
            let clause = where_clause(filter, &mut params)?;
            (
                format!("SELECT COUNT(*) AS count FROM {}{}", table, clause),
                true,
            )
        }
        Command::Upsert {
            key_column, row, ..
        } => {
            let key_column = check_identifier(key_column)?;
            let (columns, values) = columns_of(row)?;
            let updates: Vec<String> = columns
                .iter()
                .filter(|c| **c != key_column)
                .map(|c| format!("{} = excluded.{}", c, c))
                .collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})
                 ON CONFLICT({}) DO UPDATE SET {}{}updated_at = CURRENT_TIMESTAMP",
                table,
                columns.join(", "),
                placeholders(values.len()),
                key_column,
                updates.join(", "),
                if updates.is_empty() { "" } else { ", " },
            );
            params = values;
            (sql, false)
        }
    };

    Ok(Statement { sql, params, query })
}

fn execute_blocking(pool: &DbPool, command: Command) -> Result<QueryResult, String> {
    let statement = build(&command)?;
    let conn = pool.get().map_err(|e| e.to_string())?;

    if statement.query {
        let mut stmt = conn.prepare(&statement.sql).map_err(|e| e.to_string())?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(statement.params.iter()), |row| {
                let mut out = Row::new();
                for (i, name) in names.iter().enumerate() {
                    out.insert(name.clone(), from_sql(row.get_ref(i)?));
                }
                Ok(out)
            })
            .map_err(|e| e.to_string())?
            .collect::<Result<Vec<Row>, _>>()
            .map_err(|e| e.to_string())?;
        Ok(QueryResult::rows(rows))
    } else {
        let written = conn
            .execute(
                &statement.sql,
                rusqlite::params_from_iter(statement.params.iter()),
            )
            .map_err(|e| e.to_string())?;
        let last_row_id = match command {
            // Not for upserts: the conflict path leaves last_insert_rowid stale
            Command::Insert { .. } if written > 0 => {
                Some(conn.last_insert_rowid())
            }
            _ => None,
        };
        Ok(QueryResult::written(written as u64, last_row_id))
    }
}

// ── Value conversion ────────────────────────────────────────────

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        // Nested structures are stored as JSON text
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}
