//! Core types for sqlrun

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value returned by a session
///
/// Warehouses such as Snowflake return every cell as text over their REST
/// APIs, so `String` is by far the most common variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Rows returned by a single `run_statement` or `run_script` call
#[derive(Debug, Clone)]
pub struct RowSet {
    /// Unique result ID
    pub id: Uuid,
    /// Column names, in result order
    pub columns: Vec<String>,
    /// Result rows, each with one value per column
    pub rows: Vec<Vec<Value>>,
    /// Rows affected (for DML statements, when the session reports it)
    pub affected_rows: u64,
    /// Server-side handle of the statement, if the session exposes one
    pub statement_handle: Option<String>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl RowSet {
    /// Create a new empty row set
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
            statement_handle: None,
            execution_time_ms: 0,
        }
    }

    /// Create a row set from column names and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            ..Self::empty()
        }
    }

    /// Check if the result has rows
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Get a value by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}

/// An object reported by `Session::list_objects`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object name
    pub name: String,
    /// Object kind as reported by the backend (e.g. "procedure", "table")
    #[serde(default)]
    pub kind: Option<String>,
    /// Schema the object lives in
    #[serde(default)]
    pub schema: Option<String>,
    /// Signature or argument list, for routines
    #[serde(default)]
    pub arguments: Option<String>,
}

impl ObjectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            schema: None,
            arguments: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }
}
