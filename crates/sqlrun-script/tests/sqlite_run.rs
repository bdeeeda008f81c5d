//! End-to-end runs of a manifest against a SQLite session

use std::fs;
use std::path::Path;

use indoc::indoc;
use pretty_assertions::assert_eq;
use sqlrun_core::{Session, Value};
use sqlrun_driver_sqlite::SqliteSession;
use sqlrun_script::{
    ExecutionMode, FileStatus, OutcomeStatus, RunManifest, RunStatus, ScriptRunner, SkipReason,
};

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A deployment with two split-mode files, one missing file and one
/// script-mode file
fn deployment(dir: &Path) -> RunManifest {
    write(
        dir,
        "System/budget/01_tables.sql",
        indoc! {"
            CREATE TABLE budget (id INTEGER, amount INTEGER);
            CREATE TABLE period (code TEXT);
            INSERT INTO period VALUES ('2024-01');
        "},
    );
    write(
        dir,
        "System/budget/02_views.sql",
        "CREATE VIEW v_budget AS SELECT id, amount FROM budget;\n",
    );
    write(
        dir,
        "System/budget/04_adjust.sql",
        indoc! {"
            INSERT INTO budget VALUES (1, 100);
            UPDATE budget SET amount = amount * 2;
        "},
    );
    write(
        dir,
        "deploy.toml",
        indoc! {r#"
            base_dir = "System"
            files = [
                "budget/01_tables.sql",
                "budget/02_views.sql",
                "budget/03_missing.sql",
                "budget/04_adjust.sql",
            ]
            summary_pattern = "v_%"
        "#},
    );

    RunManifest::load(dir.join("deploy.toml")).unwrap()
}

#[tokio::test]
async fn test_first_run_executes_every_present_file() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = deployment(dir.path());
    let session = SqliteSession::open(&dir.path().join("run.db").to_string_lossy()).unwrap();

    let runner = ScriptRunner::new(manifest.run_options());
    let report = runner
        .run(&session, &manifest.script_files())
        .await
        .unwrap();

    assert_eq!(report.files.len(), 4);
    assert_eq!(
        report.files[0].status,
        FileStatus::Executed {
            mode: ExecutionMode::Split
        }
    );
    assert_eq!(report.files[0].outcomes.len(), 3);
    assert_eq!(report.files[2].status, FileStatus::NotFound);
    assert_eq!(
        report.files[3].status,
        FileStatus::Executed {
            mode: ExecutionMode::Script
        }
    );

    assert_eq!(report.success_count(), 5);
    assert_eq!(report.failure_count(), 0);
    assert_eq!(report.missing_files().len(), 1);
    assert_eq!(report.exit_status(), RunStatus::CompletedWithSkips);

    let names: Vec<&str> = report.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["v_budget"]);
    assert_eq!(report.objects[0].kind.as_deref(), Some("view"));

    let rows = session
        .run_statement("SELECT amount FROM budget;")
        .await
        .unwrap();
    assert_eq!(rows.get(0, "amount"), Some(&Value::Int64(200)));
}

#[tokio::test]
async fn test_rerun_tolerates_existing_objects() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = deployment(dir.path());
    let session = SqliteSession::open(&dir.path().join("run.db").to_string_lossy()).unwrap();
    let runner = ScriptRunner::new(manifest.run_options());

    runner
        .run(&session, &manifest.script_files())
        .await
        .unwrap();
    let report = runner
        .run(&session, &manifest.script_files())
        .await
        .unwrap();

    let statuses: Vec<OutcomeStatus> = report.files[0]
        .outcomes
        .iter()
        .map(|outcome| outcome.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::ToleratedSkip(SkipReason::AlreadyExists),
            OutcomeStatus::ToleratedSkip(SkipReason::AlreadyExists),
            OutcomeStatus::Succeeded,
        ]
    );
    assert_eq!(
        report.files[1].outcomes[0].status,
        OutcomeStatus::ToleratedSkip(SkipReason::AlreadyExists)
    );
    assert_eq!(report.skipped_count(), 3);
    assert_eq!(report.failure_count(), 0);
    assert_eq!(report.exit_status().exit_code(true), 0);
}

#[tokio::test]
async fn test_failing_statement_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "01_load.sql",
        indoc! {"
            CREATE TABLE ledger (id INTEGER);
            INSERT INTO missing_table VALUES (1);
            INSERT INTO ledger VALUES (1);
        "},
    );
    write(dir.path(), "run.toml", "files = [\"01_load.sql\"]\nfail_on_error = true\n");

    let manifest = RunManifest::load(dir.path().join("run.toml")).unwrap();
    let session = SqliteSession::open(":memory:").unwrap();
    let report = ScriptRunner::new(manifest.run_options())
        .run(&session, &manifest.script_files())
        .await
        .unwrap();

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);

    let (file, outcome) = report.failed_outcomes()[0];
    assert_eq!(file.listed, "01_load.sql");
    assert_eq!(outcome.unit.ordinal(), Some(2));
    assert!(
        outcome
            .error
            .as_ref()
            .unwrap()
            .message
            .contains("no such table")
    );

    assert_eq!(report.exit_status(), RunStatus::CompletedWithFailures);
    assert_eq!(report.exit_status().exit_code(manifest.fail_on_error), 1);
}
