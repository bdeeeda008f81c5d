//! sqlrun Script - Statement splitting and ordered script execution
//!
//! This crate turns an ordered list of SQL script files into calls against a
//! [`sqlrun_core::Session`]:
//!
//! - [`split`] divides one file into independently executable statements,
//!   keeping `CREATE PROCEDURE ... $$ ... $$;` blocks intact.
//! - [`ScriptRunner`] executes the files in order, either as one
//!   session-preserving script or statement by statement, and classifies
//!   failures into tolerated skips and real errors.
//! - [`RunReport`] aggregates the per-unit outcomes of a run.

mod classify;
mod error;
pub mod manifest;
mod report;
mod runner;
pub mod split;

pub use classify::{SkipReason, classify_failure};
pub use error::{RunError, RunResult};
pub use manifest::RunManifest;
pub use report::{
    ExecutionMode, ExecutionOutcome, FileReport, FileStatus, OutcomeStatus, RunReport, RunStatus,
    StatementError, UnitRef,
};
pub use runner::{
    ModeSelection, NoopObserver, RunObserver, RunOptions, ScriptFile, ScriptRunner, select_mode,
};
pub use split::{SplitResult, StatementUnit, UnitKind, split, split_statements};
