use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod mock;
pub mod resolver;
pub mod sqlite;

/// A single result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Timestamp format shared by both backends (matches SQLite's CURRENT_TIMESTAMP).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

// ── Tables ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Products,
    BlogPosts,
    Faqs,
    Testimonials,
    ContactMessages,
    SiteSettings,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Products,
        Table::BlogPosts,
        Table::Faqs,
        Table::Testimonials,
        Table::ContactMessages,
        Table::SiteSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::BlogPosts => "blog_posts",
            Table::Faqs => "faqs",
            Table::Testimonials => "testimonials",
            Table::ContactMessages => "contact_messages",
            Table::SiteSettings => "site_settings",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Commands ────────────────────────────────────────────────────

/// Row filter for list and count commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq { column: &'static str, value: Value },
    NotEq { column: &'static str, value: Value },
}

impl Filter {
    pub fn status(status: &str) -> Self {
        Filter::Eq {
            column: "status",
            value: Value::String(status.to_string()),
        }
    }

    /// Rows whose status is anything but `status`.
    pub fn status_not(status: &str) -> Self {
        Filter::NotEq {
            column: "status",
            value: Value::String(status.to_string()),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { column, value } => row.get(*column) == Some(value),
            Filter::NotEq { column, value } => row.get(*column) != Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `created_at DESC, id DESC`
    NewestFirst,
    /// `order_index ASC, created_at DESC, id DESC`
    OrderIndexThenNewest,
    /// `key ASC` (settings)
    KeyAsc,
}

/// Everything the data layer asks of a backend. Call sites build these
/// directly; neither backend parses query text to find the target table.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Insert {
        table: Table,
        row: Row,
    },
    SelectAll {
        table: Table,
        filter: Filter,
        order: Order,
    },
    SelectOne {
        table: Table,
        id: i64,
    },
    SelectByKey {
        table: Table,
        column: &'static str,
        value: Value,
    },
    /// Touches the row only when it also matches `filter`.
    Update {
        table: Table,
        id: i64,
        row: Row,
        filter: Filter,
    },
    Delete {
        table: Table,
        id: i64,
    },
    /// Yields a single row `{ "count": n }`.
    Count {
        table: Table,
        filter: Filter,
    },
    /// Insert-or-replace keyed by `key_column`.
    Upsert {
        table: Table,
        key_column: &'static str,
        row: Row,
    },
}

impl Command {
    pub fn table(&self) -> Table {
        match self {
            Command::Insert { table, .. }
            | Command::SelectAll { table, .. }
            | Command::SelectOne { table, .. }
            | Command::SelectByKey { table, .. }
            | Command::Update { table, .. }
            | Command::Delete { table, .. }
            | Command::Count { table, .. }
            | Command::Upsert { table, .. } => *table,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Insert { .. }
                | Command::Update { .. }
                | Command::Delete { .. }
                | Command::Upsert { .. }
        )
    }
}

// ── Result envelope ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub rows_read: u64,
    pub rows_written: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_row_id: Option<i64>,
}

/// Read envelope: `{ results, success, meta }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub results: Vec<Row>,
    pub success: bool,
    pub meta: Meta,
}

/// Write envelope: `{ success, meta }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub meta: Meta,
}

impl QueryResult {
    pub fn rows(results: Vec<Row>) -> Self {
        let rows_read = results.len() as u64;
        QueryResult {
            results,
            success: true,
            meta: Meta {
                rows_read,
                ..Meta::default()
            },
        }
    }

    pub fn written(rows_written: u64, last_row_id: Option<i64>) -> Self {
        QueryResult {
            results: Vec::new(),
            success: true,
            meta: Meta {
                rows_read: 0,
                rows_written,
                last_row_id,
            },
        }
    }
}

// ── Backend trait ───────────────────────────────────────────────

/// A query backend. Implementations: `SqliteBackend` (the live binding)
/// and `MockBackend` (in-memory, development only).
///
/// Backends implement `execute`; the three terminal operations are
/// views over its envelope.
#[rocket::async_trait]
pub trait QueryBackend: Send + Sync {
    /// Short backend name for logs and the health route: "sqlite" or "mock".
    fn name(&self) -> &str;

    async fn execute(&self, command: Command) -> Result<QueryResult, String>;

    /// Single row or `None`.
    async fn first(&self, command: Command) -> Result<Option<Row>, String> {
        let result = self.execute(command).await?;
        Ok(result.results.into_iter().next())
    }

    async fn all(&self, command: Command) -> Result<QueryResult, String> {
        self.execute(command).await
    }

    /// Mutation acknowledgement.
    async fn run(&self, command: Command) -> Result<RunResult, String> {
        let result = self.execute(command).await?;
        Ok(RunResult {
            success: result.success,
            meta: result.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_status() {
        let mut row = Row::new();
        row.insert("status".into(), json!("active"));
        assert!(Filter::status("active").matches(&row));
        assert!(!Filter::status("inactive").matches(&row));
        assert!(Filter::All.matches(&row));
        assert!(Filter::status_not("deleted").matches(&row));
        assert!(!Filter::status_not("active").matches(&row));
    }

    #[test]
    fn test_envelope_shapes() {
        let read = serde_json::to_value(QueryResult::rows(vec![Row::new()])).unwrap();
        assert_eq!(
            read,
            json!({ "results": [{}], "success": true, "meta": { "rows_read": 1, "rows_written": 0 } })
        );

        let write = QueryResult::written(1, Some(7));
        let run = RunResult {
            success: write.success,
            meta: write.meta,
        };
        assert_eq!(
            serde_json::to_value(run).unwrap(),
            json!({ "success": true, "meta": { "rows_read": 0, "rows_written": 1, "last_row_id": 7 } })
        );
    }

    #[test]
    fn test_command_table_and_write_flag() {
        let cmd = Command::Delete {
            table: Table::Faqs,
            id: 1,
        };
        assert_eq!(cmd.table(), Table::Faqs);
        assert!(cmd.is_write());
        let cmd = Command::Count {
            table: Table::Products,
            filter: Filter::All,
        };
        assert!(!cmd.is_write());
        assert_eq!(Table::BlogPosts.to_string(), "blog_posts");
    }
}
