//! SQLite session implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use sqlrun_core::{ObjectDescriptor, Result, RowSet, Session, SqlRunError, Value};

const IN_MEMORY: &str = ":memory:";

/// SQLite session wrapper
pub struct SqliteSession {
    conn: Mutex<RusqliteConnection>,
    closed: AtomicBool,
}

impl SqliteSession {
    /// Open a SQLite database
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");

        let conn = if path == IN_MEMORY {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SqlRunError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            let file_path = std::path::Path::new(path);
            if let Some(parent) = file_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                return Err(SqlRunError::Connection(format!(
                    "Parent directory does not exist: {}",
                    parent.display()
                )));
            }

            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;

            RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
                SqlRunError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    path, e
                ))
            })?
        };

        conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
            SqlRunError::Connection(format!("Failed to enable foreign keys: {}", e))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SqlRunError::Connection("Session is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for SqliteSession {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run_statement(&self, sql: &str) -> Result<RowSet> {
        self.ensure_open()?;
        let start_time = Instant::now();
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(sql).map_err(query_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut result = if columns.is_empty() {
            let affected = stmt.execute([]).map_err(query_error)?;
            let mut result = RowSet::empty();
            result.affected_rows = affected as u64;
            result
        } else {
            let mut rows = Vec::new();
            let mut query_rows = stmt.query([]).map_err(query_error)?;
            while let Some(row) = query_rows.next().map_err(query_error)? {
                let mut values = Vec::with_capacity(columns.len());
                for idx in 0..columns.len() {
                    values.push(rusqlite_to_value(row, idx)?);
                }
                rows.push(values);
            }
            RowSet::new(columns, rows)
        };

        result.execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = result.row_count(),
            affected_rows = result.affected_rows,
            execution_time_ms = result.execution_time_ms,
            "statement executed"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run_script(&self, sql: &str) -> Result<RowSet> {
        self.ensure_open()?;
        let start_time = Instant::now();
        let conn = self.conn.lock();

        conn.execute_batch(sql).map_err(query_error)?;

        let mut result = RowSet::empty();
        result.execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(execution_time_ms = result.execution_time_ms, "script executed");
        Ok(result)
    }

    async fn list_objects(&self, pattern: &str) -> Result<Vec<ObjectDescriptor>> {
        self.ensure_open()?;
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT name, type FROM sqlite_master \
                 WHERE name LIKE ?1 AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .map_err(query_error)?;

        let objects = stmt
            .query_map([pattern], |row| {
                Ok(ObjectDescriptor::new(row.get::<_, String>(0)?)
                    .with_kind(row.get::<_, String>(1)?)
                    .with_schema("main"))
            })
            .map_err(query_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_error)?;

        tracing::debug!(pattern = %pattern, count = objects.len(), "listed objects");
        Ok(objects)
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing SQLite session");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Keep SQLite's own message intact so failures can be classified
fn query_error(err: rusqlite::Error) -> SqlRunError {
    SqlRunError::Query(err.to_string())
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row.get_ref(idx).map_err(query_error)?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}
