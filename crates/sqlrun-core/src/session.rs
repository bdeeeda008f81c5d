//! Session trait

use crate::{ObjectDescriptor, Result, RowSet};
use async_trait::async_trait;

/// An open session against a warehouse
///
/// A session is implicitly stateful: variables assigned with `SET` are bound
/// to whatever server-side session executed them. The two execution entry
/// points differ in what they promise about that state:
///
/// - [`Session::run_script`] executes every statement of `sql` in one call and
///   guarantees that variables set by an earlier statement are visible to the
///   later statements of the same call.
/// - [`Session::run_statement`] executes exactly one statement. Two separate
///   calls are *not* guaranteed to observe each other's session variables
///   (the Snowflake REST API, for example, runs every request in a fresh
///   session).
///
/// Callers that depend on session variables must therefore use `run_script`.
#[async_trait]
pub trait Session: Send + Sync {
    /// Get the driver name (e.g., "snowflake", "sqlite")
    fn driver_name(&self) -> &str;

    /// Execute a single statement
    async fn run_statement(&self, sql: &str) -> Result<RowSet>;

    /// Execute a multi-statement script, preserving session variables across
    /// the statements of the script
    async fn run_script(&self, sql: &str) -> Result<RowSet>;

    /// List objects whose name matches a `LIKE` pattern (e.g. `USP_%`)
    async fn list_objects(&self, pattern: &str) -> Result<Vec<ObjectDescriptor>>;

    /// Close the session
    async fn close(&self) -> Result<()>;

    /// Check if the session is closed
    fn is_closed(&self) -> bool;
}

/// Quote a `LIKE` pattern as a single-quoted SQL string literal
pub fn quote_pattern(pattern: &str) -> String {
    format!("'{}'", pattern.replace('\'', "''"))
}
