//! Run report types
//!
//! A [`RunReport`] holds one [`FileReport`] per listed file, in run order,
//! and each file report holds the outcomes of the calls made for it.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlrun_core::{ObjectDescriptor, SqlRunError};

use crate::{SkipReason, UnitKind};

/// How a file was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// The whole file in one `run_script` call, keeping session variables
    Script,
    /// One `run_statement` call per split unit
    Split,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Script => f.write_str("script"),
            ExecutionMode::Split => f.write_str("split"),
        }
    }
}

/// Status of one executed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum OutcomeStatus {
    /// The call succeeded
    Succeeded,
    /// The call failed with a benign idempotency error
    ToleratedSkip(SkipReason),
    /// The call failed
    Failed,
}

/// Error information for a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementError {
    /// Error message
    pub message: String,
    /// Error code (if available from the warehouse)
    pub code: Option<String>,
}

impl StatementError {
    /// Create a new statement error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a statement error with a code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<SqlRunError> for StatementError {
    fn from(err: SqlRunError) -> Self {
        Self::new(err.message())
    }
}

impl std::fmt::Display for StatementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{}] {}", code, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// What an outcome refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit")]
pub enum UnitRef {
    /// The whole file, executed in script mode
    Script,
    /// One split unit
    Statement {
        ordinal: usize,
        kind: UnitKind,
        start_line: usize,
        sql: String,
    },
}

impl UnitRef {
    /// SQL of the unit, when the outcome refers to a single statement
    pub fn sql(&self) -> Option<&str> {
        match self {
            UnitRef::Script => None,
            UnitRef::Statement { sql, .. } => Some(sql),
        }
    }

    /// 1-based ordinal of the unit within its file
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            UnitRef::Script => None,
            UnitRef::Statement { ordinal, .. } => Some(*ordinal),
        }
    }
}

/// Result of one call against the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub unit: UnitRef,
    pub status: OutcomeStatus,
    /// Error details (for skips and failures)
    pub error: Option<StatementError>,
    /// Execution time for this call
    pub execution_time: Duration,
}

impl ExecutionOutcome {
    /// Create a successful outcome
    pub fn succeeded(unit: UnitRef, duration: Duration) -> Self {
        Self {
            unit,
            status: OutcomeStatus::Succeeded,
            error: None,
            execution_time: duration,
        }
    }

    /// Create an outcome for a failed call, already classified
    pub fn from_failure(
        unit: UnitRef,
        status: OutcomeStatus,
        error: StatementError,
        duration: Duration,
    ) -> Self {
        Self {
            unit,
            status,
            error: Some(error),
            execution_time: duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::ToleratedSkip(_))
    }
}

/// File-level status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum FileStatus {
    /// The file was executed; its outcomes are in the report
    Executed { mode: ExecutionMode },
    /// The file does not exist
    NotFound,
    /// The file holds no SQL
    Empty,
    /// The file exists but could not be read as UTF-8 text
    Unreadable { reason: String },
}

/// Report for one listed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// 1-based position in the run list
    pub ordinal: usize,
    /// Path as listed in the run list
    pub listed: String,
    /// Resolved path that was read
    pub path: PathBuf,
    pub status: FileStatus,
    /// Outcomes in execution order
    pub outcomes: Vec<ExecutionOutcome>,
    /// Splitting ended inside an unterminated procedure
    pub incomplete_split: bool,
}

impl FileReport {
    pub fn mode(&self) -> Option<ExecutionMode> {
        match self.status {
            FileStatus::Executed { mode } => Some(mode),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == FileStatus::NotFound
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.is_failed())
    }
}

/// Overall result of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every call succeeded and every file was found
    Clean,
    /// No failures, but some calls were tolerated or files were missing
    CompletedWithSkips,
    /// At least one call failed or a file could not be read
    CompletedWithFailures,
}

impl RunStatus {
    /// Process exit code for this status
    ///
    /// Failures only produce a non-zero code when `fail_on_error` is set.
    pub fn exit_code(self, fail_on_error: bool) -> i32 {
        match self {
            RunStatus::CompletedWithFailures if fail_on_error => 1,
            _ => 0,
        }
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// File reports in run order
    pub files: Vec<FileReport>,
    pub started_at: DateTime<Utc>,
    /// Total execution time for the entire run
    pub total_execution_time: Duration,
    /// Objects returned by the end-of-run listing, if one was requested
    pub objects: Vec<ObjectDescriptor>,
    /// Error of the end-of-run summary listing
    pub summary_error: Option<String>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            files: Vec::new(),
            started_at,
            total_execution_time: Duration::ZERO,
            objects: Vec::new(),
            summary_error: None,
        }
    }

    /// All outcomes across files, in execution order
    pub fn outcomes(&self) -> impl Iterator<Item = &ExecutionOutcome> {
        self.files.iter().flat_map(|f| f.outcomes.iter())
    }

    pub fn success_count(&self) -> usize {
        self.outcomes().filter(|o| o.is_success()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes().filter(|o| o.is_skipped()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes().filter(|o| o.is_failed()).count()
    }

    /// Number of calls made against the session
    pub fn outcome_count(&self) -> usize {
        self.outcomes().count()
    }

    /// Files that were not found
    pub fn missing_files(&self) -> Vec<&FileReport> {
        self.files.iter().filter(|f| f.is_not_found()).collect()
    }

    /// Files that exist but could not be read
    pub fn unreadable_files(&self) -> Vec<&FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Unreadable { .. }))
            .collect()
    }

    /// Failed outcomes together with the file they belong to
    pub fn failed_outcomes(&self) -> Vec<(&FileReport, &ExecutionOutcome)> {
        self.files
            .iter()
            .flat_map(|f| f.outcomes.iter().map(move |o| (f, o)))
            .filter(|(_, o)| o.is_failed())
            .collect()
    }

    /// Check if any call failed or any file could not be read
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0 || !self.unreadable_files().is_empty()
    }

    /// Overall status of the run
    pub fn exit_status(&self) -> RunStatus {
        if self.has_failures() {
            RunStatus::CompletedWithFailures
        } else if self.skipped_count() > 0
            || !self.missing_files().is_empty()
            || self.summary_error.is_some()
        {
            RunStatus::CompletedWithSkips
        } else {
            RunStatus::Clean
        }
    }
}
