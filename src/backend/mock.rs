use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{now_timestamp, Command, Filter, Order, QueryBackend, QueryResult, Row, Table};

#[derive(Default)]
struct MockTable {
    rows: Vec<Row>,
    next_id: i64,
}

impl MockTable {
    fn position(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|r| row_id(r) == Some(id))
    }

    fn insert(&mut self, mut row: Row) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        let now = now_timestamp();
        row.insert("id".into(), Value::from(id));
        row.entry("created_at").or_insert_with(|| Value::String(now.clone()));
        row.entry("updated_at").or_insert_with(|| Value::String(now));
        self.rows.push(row);
        id
    }
}

/// In-memory stand-in for the SQLite backend, used when no binding is
/// configured. Shape-compatible only: no foreign keys, no type checks,
/// and the only uniqueness honoured is the upsert key.
#[derive(Default)]
pub struct MockBackend {
    tables: Mutex<HashMap<Table, MockTable>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held for `table`.
    #[cfg(test)]
    pub fn len(&self, table: Table) -> usize {
        self.tables
            .lock()
            .map(|t| t.get(&table).map(|m| m.rows.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    fn apply(&self, command: Command) -> Result<QueryResult, String> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| "mock backend lock poisoned".to_string())?;

        match command {
            Command::Insert { table, row } => {
                let id = tables.entry(table).or_default().insert(row);
                Ok(QueryResult::written(1, Some(id)))
            }
            Command::SelectAll {
                table,
                filter,
                order,
            } => {
                let mut rows: Vec<Row> = tables
                    .get(&table)
                    .map(|t| t.rows.iter().filter(|r| filter.matches(r)).cloned().collect())
                    .unwrap_or_default();
                rows.sort_by(|a, b| compare_rows(a, b, order));
                Ok(QueryResult::rows(rows))
            }
            Command::SelectOne { table, id } => {
                let rows = tables
                    .get(&table)
                    .and_then(|t| t.position(id).map(|i| t.rows[i].clone()))
                    .into_iter()
                    .collect();
                Ok(QueryResult::rows(rows))
            }
            Command::SelectByKey {
                table,
                column,
                value,
            } => {
                let filter = Filter::Eq { column, value };
                let rows = tables
                    .get(&table)
                    .and_then(|t| t.rows.iter().find(|r| filter.matches(r)).cloned())
                    .into_iter()
                    .collect();
                Ok(QueryResult::rows(rows))
            }
            Command::Update {
                table,
                id,
                row,
                filter,
            } => {
                let Some(t) = tables.get_mut(&table) else {
                    return Ok(QueryResult::written(0, None));
                };
                let Some(i) = t.position(id).filter(|i| filter.matches(&t.rows[*i])) else {
                    return Ok(QueryResult::written(0, None));
                };
                let existing = &mut t.rows[i];
                for (k, v) in row {
                    if k != "id" {
                        existing.insert(k, v);
                    }
                }
                existing.insert("updated_at".into(), Value::String(now_timestamp()));
                Ok(QueryResult::written(1, None))
            }
            Command::Delete { table, id } => {
                let removed = tables
                    .get_mut(&table)
                    .and_then(|t| t.position(id).map(|i| t.rows.remove(i)))
                    .is_some();
                Ok(QueryResult::written(u64::from(removed), None))
            }
            Command::Count { table, filter } => {
                let count = tables
                    .get(&table)
                    .map(|t| t.rows.iter().filter(|r| filter.matches(r)).count())
                    .unwrap_or(0);
                let mut row = Row::new();
                row.insert("count".into(), Value::from(count as i64));
                Ok(QueryResult::rows(vec![row]))
            }
            Command::Upsert {
                table,
                key_column,
                row,
            } => {
                let t = tables.entry(table).or_default();
                let key = row.get(key_column).cloned().unwrap_or(Value::Null);
                let existing = t
                    .rows
                    .iter()
                    .position(|r| r.get(key_column) == Some(&key));
                // Upserts report no row id, matching the SQLite backend
                match existing {
                    Some(i) => {
                        let old = &mut t.rows[i];
                        for (k, v) in row {
                            old.insert(k, v);
                        }
                        old.insert("updated_at".into(), Value::String(now_timestamp()));
                    }
                    None => {
                        t.insert(row);
                    }
                }
                Ok(QueryResult::written(1, None))
            }
        }
    }
}

#[rocket::async_trait]
impl QueryBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, command: Command) -> Result<QueryResult, String> {
        self.apply(command)
    }
}

fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn text<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).and_then(Value::as_str).unwrap_or("")
}

fn newest_first(a: &Row, b: &Row) -> Ordering {
    text(b, "created_at")
        .cmp(text(a, "created_at"))
        .then_with(|| row_id(b).cmp(&row_id(a)))
}

fn compare_rows(a: &Row, b: &Row, order: Order) -> Ordering {
    match order {
        Order::NewestFirst => newest_first(a, b),
        Order::OrderIndexThenNewest => {
            let ia = a.get("order_index").and_then(Value::as_i64).unwrap_or(0);
            let ib = b.get("order_index").and_then(Value::as_i64).unwrap_or(0);
            ia.cmp(&ib).then_with(|| newest_first(a, b))
        }
        Order::KeyAsc => text(a, "key").cmp(text(b, "key")),
    }
}
