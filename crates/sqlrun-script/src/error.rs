//! Run errors

use sqlrun_core::SqlRunError;
use thiserror::Error;

pub type RunResult<T> = Result<T, RunError>;

/// Errors that abort a run
///
/// Per-statement failures never show up here; they are recorded in the
/// [`RunReport`](crate::RunReport) instead.
#[derive(Debug, Error)]
pub enum RunError {
    /// The session could not be used before the first file ran
    #[error("Setup failed: {0}")]
    Setup(#[source] SqlRunError),

    #[error("Invalid run manifest: {0}")]
    Manifest(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
