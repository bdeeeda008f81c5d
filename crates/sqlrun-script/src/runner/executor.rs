//! Script runner implementation

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlrun_core::{Session, SqlRunError};

use crate::{
    ExecutionMode, ExecutionOutcome, FileReport, FileStatus, RunError, RunReport, RunResult,
    StatementError, UnitRef, classify_failure, split,
};

/// Upper-cased keyword that marks a script as using session variables
const SESSION_VARIABLE_KEYWORD: &str = "SET ";

/// Lower-cased path fragment that marks a test script
const TEST_PATH_MARKER: &str = "test";

/// How the runner picks the execution mode of each file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    /// Decide per file from its content and listed path
    #[default]
    Auto,
    /// Run every file as one script
    Script,
    /// Split every file into statements
    Split,
}

/// Configuration options for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Execution mode selection
    pub mode: ModeSelection,
    /// Whether failed units should make the run exit non-zero
    pub fail_on_error: bool,
    /// `LIKE` pattern of the objects listed after the last file
    pub summary_pattern: Option<String>,
    /// Statements executed before the first file
    pub setup_statements: Vec<String>,
}

impl RunOptions {
    /// Create new run options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mode selection
    pub fn with_mode(mut self, mode: ModeSelection) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    /// List objects matching `pattern` once every file has run
    pub fn with_summary_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.summary_pattern = Some(pattern.into());
        self
    }

    /// Append a setup statement
    pub fn with_setup_statement(mut self, sql: impl Into<String>) -> Self {
        self.setup_statements.push(sql.into());
        self
    }
}

/// One entry of the ordered run list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFile {
    /// 1-based position in the run list
    pub ordinal: usize,
    /// Path as written in the run list
    pub listed: String,
    /// Path the runner reads
    pub path: PathBuf,
}

impl ScriptFile {
    pub fn new(ordinal: usize, listed: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            ordinal,
            listed: listed.into(),
            path: path.into(),
        }
    }

    /// Build the run list from entries relative to `base_dir`
    pub fn resolve_all<S: AsRef<str>>(base_dir: &Path, entries: &[S]) -> Vec<Self> {
        entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let listed = entry.as_ref();
                Self::new(idx + 1, listed, base_dir.join(listed))
            })
            .collect()
    }
}

/// Callbacks invoked as a run progresses
///
/// Every method defaults to doing nothing.
pub trait RunObserver: Send {
    /// A file was read and is about to execute
    fn file_started(&mut self, _file: &ScriptFile, _mode: ExecutionMode) {}

    /// A file was not executed (missing, empty or unreadable)
    fn file_skipped(&mut self, _file: &ScriptFile, _status: &FileStatus) {}

    /// One call against the session finished
    fn outcome_recorded(&mut self, _file: &ScriptFile, _outcome: &ExecutionOutcome) {}

    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Pick the execution mode of one file
///
/// With [`ModeSelection::Auto`], a file runs as one script when its text
/// contains the `SET ` keyword (case-insensitive) or its listed path contains
/// `test`; otherwise it is split.
pub fn select_mode(text: &str, listed: &str, selection: ModeSelection) -> ExecutionMode {
    match selection {
        ModeSelection::Script => ExecutionMode::Script,
        ModeSelection::Split => ExecutionMode::Split,
        ModeSelection::Auto => {
            if text.to_uppercase().contains(SESSION_VARIABLE_KEYWORD)
                || listed.to_lowercase().contains(TEST_PATH_MARKER)
            {
                ExecutionMode::Script
            } else {
                ExecutionMode::Split
            }
        }
    }
}

/// Ordered script runner
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    options: RunOptions,
}

impl ScriptRunner {
    /// Create a new runner with the given options
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Create a runner with default options
    pub fn with_defaults() -> Self {
        Self::new(RunOptions::default())
    }

    /// Get the current options
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Execute `files` in order
    ///
    /// Only setup failures are returned as errors. Missing files, tolerated
    /// collisions and failed statements are all recorded in the report and
    /// the run continues with the next unit.
    pub async fn run(&self, session: &dyn Session, files: &[ScriptFile]) -> RunResult<RunReport> {
        self.run_with_observer(session, files, &mut NoopObserver).await
    }

    /// Execute `files` in order, reporting progress to `observer`
    #[tracing::instrument(skip_all, fields(driver = session.driver_name(), files = files.len()))]
    pub async fn run_with_observer(
        &self,
        session: &dyn Session,
        files: &[ScriptFile],
        observer: &mut dyn RunObserver,
    ) -> RunResult<RunReport> {
        let started_at = Utc::now();
        let run_start = Instant::now();

        if session.is_closed() {
            return Err(RunError::Setup(SqlRunError::Connection(
                "Session is closed".into(),
            )));
        }

        for sql in &self.options.setup_statements {
            tracing::debug!(
                sql_preview = %sql.chars().take(100).collect::<String>(),
                "running setup statement"
            );
            session.run_statement(sql).await.map_err(RunError::Setup)?;
        }

        let mut report = RunReport::new(started_at);
        for file in files {
            let file_report = self.run_file(session, file, observer).await;
            report.files.push(file_report);
        }

        if let Some(pattern) = &self.options.summary_pattern {
            match session.list_objects(pattern).await {
                Ok(objects) => {
                    tracing::debug!(pattern = %pattern, count = objects.len(), "listed objects");
                    report.objects = objects;
                }
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "summary listing failed");
                    report.summary_error = Some(e.message());
                }
            }
        }

        report.total_execution_time = run_start.elapsed();
        tracing::info!(
            succeeded = report.success_count(),
            skipped = report.skipped_count(),
            failed = report.failure_count(),
            missing = report.missing_files().len(),
            duration_ms = report.total_execution_time.as_millis() as u64,
            "run finished"
        );

        observer.run_finished(&report);
        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(file = %file.listed, ordinal = file.ordinal))]
    async fn run_file(
        &self,
        session: &dyn Session,
        file: &ScriptFile,
        observer: &mut dyn RunObserver,
    ) -> FileReport {
        let mut report = FileReport {
            ordinal: file.ordinal,
            listed: file.listed.clone(),
            path: file.path.clone(),
            status: FileStatus::Empty,
            outcomes: Vec::new(),
            incomplete_split: false,
        };

        let text = match tokio::fs::read_to_string(&file.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %file.path.display(), "file not found");
                report.status = FileStatus::NotFound;
                observer.file_skipped(file, &report.status);
                return report;
            }
            Err(e) => {
                tracing::error!(path = %file.path.display(), error = %e, "failed to read file");
                report.status = FileStatus::Unreadable {
                    reason: describe_read_error(&e),
                };
                observer.file_skipped(file, &report.status);
                return report;
            }
        };

        if text.trim().is_empty() {
            tracing::debug!("file is empty");
            observer.file_skipped(file, &report.status);
            return report;
        }

        let mode = select_mode(&text, &file.listed, self.options.mode);
        tracing::debug!(mode = %mode, "executing file");
        report.status = FileStatus::Executed { mode };
        observer.file_started(file, mode);

        match mode {
            ExecutionMode::Script => {
                let outcome = execute_unit(session, UnitRef::Script, &text).await;
                observer.outcome_recorded(file, &outcome);
                report.outcomes.push(outcome);
            }
            ExecutionMode::Split => {
                let result = split(&text);
                if result.incomplete {
                    tracing::warn!(
                        "file ends inside a procedure definition; running the remainder as one unit"
                    );
                }
                report.incomplete_split = result.incomplete;

                for unit in result.units {
                    let unit_ref = UnitRef::Statement {
                        ordinal: unit.ordinal,
                        kind: unit.kind,
                        start_line: unit.start_line,
                        sql: unit.text,
                    };
                    let outcome = execute_unit(session, unit_ref, &text).await;
                    observer.outcome_recorded(file, &outcome);
                    report.outcomes.push(outcome);
                }
            }
        }

        report
    }
}

/// Execute one unit and classify its result
///
/// `script` is the whole file text, used when `unit` is [`UnitRef::Script`].
async fn execute_unit(session: &dyn Session, unit: UnitRef, script: &str) -> ExecutionOutcome {
    let start = Instant::now();

    let result = match &unit {
        UnitRef::Script => session.run_script(script).await,
        UnitRef::Statement { sql, .. } => session.run_statement(sql).await,
    };

    let duration = start.elapsed();

    match result {
        Ok(_) => {
            tracing::trace!(
                unit = ?unit.ordinal(),
                duration_ms = duration.as_millis() as u64,
                "unit succeeded"
            );
            ExecutionOutcome::succeeded(unit, duration)
        }
        Err(e) => {
            let error = StatementError::from(e);
            let status = classify_failure(&error.message, unit.sql());
            tracing::debug!(
                unit = ?unit.ordinal(),
                status = ?status,
                error = %error,
                "unit failed"
            );
            ExecutionOutcome::from_failure(unit, status, error, duration)
        }
    }
}

fn describe_read_error(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::InvalidData => "file is not valid UTF-8".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => err.to_string(),
    }
}
