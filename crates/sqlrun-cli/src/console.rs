//! Progress and summary output

use std::io::Write;

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use sqlrun_script::{
    ExecutionMode, ExecutionOutcome, FileStatus, OutcomeStatus, RunObserver, RunReport,
    ScriptFile, UnitRef,
};

const STATEMENT_PREVIEW_CHARS: usize = 100;
const ERROR_PREVIEW_CHARS: usize = 200;

const SUCCEEDED: &str = "✓";
const SKIPPED: &str = "⊘";
const FAILED: &str = "✗";
const NOT_FOUND: &str = "⚠";

/// Collapse whitespace and cut `text` to `limit` characters
pub fn preview(text: &str, limit: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut cut: String = flat.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

/// Prints one line per file and per executed unit
pub struct ConsoleObserver<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!(error = %e, "failed to write progress");
        }
    }
}

impl<W: Write + Send> RunObserver for ConsoleObserver<W> {
    fn file_started(&mut self, file: &ScriptFile, mode: ExecutionMode) {
        let how = match mode {
            ExecutionMode::Script => "as one script",
            ExecutionMode::Split => "statement by statement",
        };
        self.line(&format!("\n[{}] {} ({})", file.ordinal, file.listed, how));
    }

    fn file_skipped(&mut self, file: &ScriptFile, status: &FileStatus) {
        let text = match status {
            FileStatus::NotFound => {
                format!("{} File not found: {}", NOT_FOUND, file.path.display())
            }
            FileStatus::Empty => format!("{} Empty file: {}", SKIPPED, file.listed),
            FileStatus::Unreadable { reason } => {
                format!("{} Could not read {}: {}", FAILED, file.listed, reason)
            }
            FileStatus::Executed { .. } => return,
        };
        self.line(&format!("\n[{}] {}", file.ordinal, text));
    }

    fn outcome_recorded(&mut self, _file: &ScriptFile, outcome: &ExecutionOutcome) {
        let subject = match &outcome.unit {
            UnitRef::Script => "Script executed".to_string(),
            UnitRef::Statement { ordinal, sql, .. } => {
                format!("#{} {}", ordinal, preview(sql, STATEMENT_PREVIEW_CHARS))
            }
        };

        let text = match outcome.status {
            OutcomeStatus::Succeeded => format!("  {} {}", SUCCEEDED, subject),
            OutcomeStatus::ToleratedSkip(reason) => {
                format!("  {} Skipped ({}): {}", SKIPPED, reason, subject)
            }
            OutcomeStatus::Failed => {
                let error = outcome
                    .error
                    .as_ref()
                    .map(|e| preview(&e.message, ERROR_PREVIEW_CHARS))
                    .unwrap_or_default();
                format!("  {} Failed: {}\n      {}", FAILED, subject, error)
            }
        };
        self.line(&text);
    }
}

/// Counts, failures and listed objects of a finished run
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();

    let mut counts = Table::new();
    counts
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Result", "Count"]);
    counts.add_row(vec![
        Cell::new(format!("{} Succeeded", SUCCEEDED)),
        Cell::new(report.success_count()),
    ]);
    counts.add_row(vec![
        Cell::new(format!("{} Skipped", SKIPPED)),
        Cell::new(report.skipped_count()),
    ]);
    counts.add_row(vec![
        Cell::new(format!("{} Failed", FAILED)),
        Cell::new(report.failure_count()),
    ]);
    counts.add_row(vec![
        Cell::new(format!("{} Files not found", NOT_FOUND)),
        Cell::new(report.missing_files().len()),
    ]);
    let unreadable = report.unreadable_files().len();
    if unreadable > 0 {
        counts.add_row(vec![
            Cell::new(format!("{} Unreadable files", FAILED)),
            Cell::new(unreadable),
        ]);
    }
    out.push_str(&format!(
        "\nRun summary ({:.1}s)\n{}\n",
        report.total_execution_time.as_secs_f64(),
        counts
    ));

    let failed = report.failed_outcomes();
    if !failed.is_empty() {
        out.push_str("\nFailures:\n");
        for (file, outcome) in failed {
            let location = match outcome.unit.ordinal() {
                Some(ordinal) => format!("{} #{}", file.listed, ordinal),
                None => file.listed.clone(),
            };
            let message = outcome
                .error
                .as_ref()
                .map(|e| preview(&e.message, ERROR_PREVIEW_CHARS))
                .unwrap_or_default();
            out.push_str(&format!("  {} {}: {}\n", FAILED, location, message));
        }
    }

    if let Some(error) = &report.summary_error {
        out.push_str(&format!(
            "\n{} Could not list objects: {}\n",
            NOT_FOUND,
            preview(error, ERROR_PREVIEW_CHARS)
        ));
    } else if !report.objects.is_empty() {
        let mut objects = Table::new();
        objects
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Name", "Kind", "Schema", "Arguments"]);
        for object in &report.objects {
            objects.add_row(vec![
                object.name.as_str(),
                object.kind.as_deref().unwrap_or(""),
                object.schema.as_deref().unwrap_or(""),
                object.arguments.as_deref().unwrap_or(""),
            ]);
        }
        out.push_str(&format!(
            "\nObjects ({})\n{}\n",
            report.objects.len(),
            objects
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use sqlrun_core::ObjectDescriptor;
    use sqlrun_script::{FileReport, SkipReason, StatementError, UnitKind};
    use std::path::PathBuf;
    use std::time::Duration;

    fn statement(ordinal: usize, sql: &str) -> UnitRef {
        UnitRef::Statement {
            ordinal,
            kind: UnitKind::Simple,
            start_line: 1,
            sql: sql.to_string(),
        }
    }

    fn script_file(ordinal: usize, listed: &str) -> ScriptFile {
        ScriptFile::new(ordinal, listed, PathBuf::from("/deploy").join(listed))
    }

    fn printed(observer: ConsoleObserver<Vec<u8>>) -> String {
        String::from_utf8(observer.into_inner()).unwrap()
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("SELECT 1\n  FROM dual;", 100), "SELECT 1 FROM dual;");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééé", 3), "ééé");
    }

    #[test]
    fn test_progress_lines_use_glyphs() {
        let file = script_file(1, "budget/01_tables.sql");
        let mut observer = ConsoleObserver::new(Vec::new());

        observer.file_started(&file, ExecutionMode::Split);
        observer.outcome_recorded(
            &file,
            &ExecutionOutcome::succeeded(statement(1, "CREATE TABLE a (id INT);"), Duration::ZERO),
        );
        observer.outcome_recorded(
            &file,
            &ExecutionOutcome::from_failure(
                statement(2, "CREATE TABLE b (id INT);"),
                OutcomeStatus::ToleratedSkip(SkipReason::AlreadyExists),
                StatementError::new("Object 'B' already exists."),
                Duration::ZERO,
            ),
        );
        observer.outcome_recorded(
            &file,
            &ExecutionOutcome::from_failure(
                statement(3, "INSERT INTO c VALUES (1);"),
                OutcomeStatus::Failed,
                StatementError::new("Object 'C' does not exist."),
                Duration::ZERO,
            ),
        );
        observer.file_skipped(&script_file(2, "budget/02_missing.sql"), &FileStatus::NotFound);

        assert_eq!(
            printed(observer),
            "\n[1] budget/01_tables.sql (statement by statement)\n\
             \x20 ✓ #1 CREATE TABLE a (id INT);\n\
             \x20 ⊘ Skipped (already exists): #2 CREATE TABLE b (id INT);\n\
             \x20 ✗ Failed: #3 INSERT INTO c VALUES (1);\n\
             \x20     Object 'C' does not exist.\n\
             \n[2] ⚠ File not found: /deploy/budget/02_missing.sql\n"
        );
    }

    #[test]
    fn test_script_outcome_line() {
        let file = script_file(1, "budget/99_test.sql");
        let mut observer = ConsoleObserver::new(Vec::new());

        observer.file_started(&file, ExecutionMode::Script);
        observer.outcome_recorded(&file, &ExecutionOutcome::succeeded(UnitRef::Script, Duration::ZERO));

        assert_eq!(
            printed(observer),
            "\n[1] budget/99_test.sql (as one script)\n  ✓ Script executed\n"
        );
    }

    #[test]
    fn test_summary_lists_failures_and_objects() {
        let mut report = RunReport::new(Utc::now());
        let file = script_file(1, "budget/01_tables.sql");
        report.files.push(FileReport {
            ordinal: 1,
            listed: file.listed.clone(),
            path: file.path.clone(),
            status: FileStatus::Executed {
                mode: ExecutionMode::Split,
            },
            outcomes: vec![
                ExecutionOutcome::succeeded(statement(1, "CREATE TABLE a (id INT);"), Duration::ZERO),
                ExecutionOutcome::from_failure(
                    statement(2, "INSERT INTO c VALUES (1);"),
                    OutcomeStatus::Failed,
                    StatementError::new("no such table: c"),
                    Duration::ZERO,
                ),
            ],
            incomplete_split: false,
        });
        report.objects = vec![
            ObjectDescriptor::new("USP_LOAD_BUDGET")
                .with_kind("procedure")
                .with_schema("BUDGETS"),
        ];

        let summary = render_summary(&report);
        assert!(summary.contains("Succeeded"));
        assert!(summary.contains("budget/01_tables.sql #2: no such table: c"));
        assert!(summary.contains("Objects (1)"));
        assert!(summary.contains("USP_LOAD_BUDGET"));
        assert!(!summary.contains("Unreadable"));
    }

    #[test]
    fn test_summary_reports_listing_error() {
        let mut report = RunReport::new(Utc::now());
        report.summary_error = Some("Insufficient privileges".to_string());

        let summary = render_summary(&report);
        assert!(summary.contains("⚠ Could not list objects: Insufficient privileges"));
        assert!(!summary.contains("Objects ("));
    }
}
