//! Unit tests for the SQLite driver

use super::*;
use sqlrun_core::{Session, SessionConfig, SessionDriver, SqlRunError, Value};

#[test]
fn test_sqlite_driver_id() {
    let driver = SqliteDriver::new();
    assert_eq!(driver.id(), "sqlite");
    assert_eq!(driver.display_name(), "SQLite");
    assert_eq!(driver.required_params(), &["path"]);
}

#[tokio::test]
async fn test_connect_requires_path() {
    let driver = SqliteDriver::new();
    let result = driver.connect(&SessionConfig::new("sqlite")).await;

    assert!(matches!(result, Err(SqlRunError::Configuration(_))));
}

#[tokio::test]
async fn test_connect_rejects_missing_parent_directory() {
    let driver = SqliteDriver::new();
    let config = SessionConfig::new_sqlite("/nonexistent/dir/run.db");

    let result = driver.connect(&config).await;
    assert!(matches!(result, Err(SqlRunError::Connection(_))));
}

#[tokio::test]
async fn test_run_statement_returns_rows() {
    let session = SqliteSession::open(":memory:").unwrap();

    session
        .run_statement("CREATE TABLE budget (id INTEGER, name TEXT);")
        .await
        .unwrap();
    let insert = session
        .run_statement("INSERT INTO budget VALUES (1, 'opex'), (2, 'capex');")
        .await
        .unwrap();
    assert_eq!(insert.affected_rows, 2);

    let rows = session
        .run_statement("SELECT id, name FROM budget ORDER BY id;")
        .await
        .unwrap();
    assert_eq!(rows.columns, vec!["id", "name"]);
    assert_eq!(rows.row_count(), 2);
    assert_eq!(rows.get(1, "NAME"), Some(&Value::String("capex".into())));
}

#[tokio::test]
async fn test_run_statement_with_leading_comment() {
    let session = SqliteSession::open(":memory:").unwrap();

    session
        .run_statement("-- staging table\nCREATE TABLE stage (id INTEGER);")
        .await
        .unwrap();

    let objects = session.list_objects("stage").await.unwrap();
    assert_eq!(objects.len(), 1);
}

#[tokio::test]
async fn test_run_script_executes_every_statement() {
    let session = SqliteSession::open(":memory:").unwrap();

    session
        .run_script(
            "CREATE TABLE a (id INTEGER);\nINSERT INTO a VALUES (1);\nINSERT INTO a VALUES (2);",
        )
        .await
        .unwrap();

    let rows = session
        .run_statement("SELECT COUNT(*) AS n FROM a")
        .await
        .unwrap();
    assert_eq!(rows.get(0, "n").and_then(Value::as_i64), Some(2));
}

#[tokio::test]
async fn test_errors_keep_sqlite_message() {
    let session = SqliteSession::open(":memory:").unwrap();
    session.run_statement("CREATE TABLE t (id INTEGER)").await.unwrap();

    let err = session
        .run_statement("CREATE TABLE t (id INTEGER)")
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRunError::Query(_)));
    assert!(err.message().contains("already exists"));
}

#[tokio::test]
async fn test_list_objects_filters_by_pattern() {
    let session = SqliteSession::open(":memory:").unwrap();
    session
        .run_script(
            "CREATE TABLE usp_budget (id INTEGER);\n\
             CREATE VIEW usp_budget_view AS SELECT id FROM usp_budget;\n\
             CREATE TABLE other (id INTEGER);",
        )
        .await
        .unwrap();

    let objects = session.list_objects("usp_%").await.unwrap();
    let names: Vec<_> = objects.iter().map(|o| o.name.as_str()).collect();

    assert_eq!(names, vec!["usp_budget", "usp_budget_view"]);
    assert_eq!(objects[1].kind.as_deref(), Some("view"));
    assert_eq!(objects[0].schema.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_closed_session_rejects_calls() {
    let session = SqliteSession::open(":memory:").unwrap();
    session.close().await.unwrap();

    assert!(session.is_closed());
    assert!(matches!(
        session.run_statement("SELECT 1").await,
        Err(SqlRunError::Connection(_))
    ));
}

#[tokio::test]
async fn test_file_database_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("run.db");
    let config = SessionConfig::new_sqlite(path.to_str().unwrap());

    let session = SqliteDriver::new().connect(&config).await.unwrap();
    session.run_statement("CREATE TABLE t (id INTEGER)").await.unwrap();
    session.close().await.unwrap();

    let reopened = SqliteDriver::new().connect(&config).await.unwrap();
    let objects = reopened.list_objects("t").await.unwrap();
    assert_eq!(objects.len(), 1);
}
