//! Failure classification
//!
//! Re-running a deployment script hits objects that already exist, and drops
//! of objects that were never created. Those errors are idempotency
//! collisions rather than real failures and are recorded as skips.

use serde::{Deserialize, Serialize};

use crate::OutcomeStatus;

const ALREADY_EXISTS: &str = "already exists";
const DOES_NOT_EXIST: &str = "does not exist";
const DROP_KEYWORD: &str = "drop";

/// Why a failed call was tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A create collided with an existing object
    AlreadyExists,
    /// A `DROP` statement targeted an object that is not there
    DropTargetMissing,
    /// A whole script referenced a missing object
    ObjectMissing,
}

impl SkipReason {
    /// Short human readable label
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::AlreadyExists => "already exists",
            SkipReason::DropTargetMissing => "object not found for DROP",
            SkipReason::ObjectMissing => "object not found",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify the error of a failed call
///
/// `statement` is the SQL of the failed unit in split mode, and `None` when a
/// whole file ran as one script. Matching is case-insensitive.
pub fn classify_failure(message: &str, statement: Option<&str>) -> OutcomeStatus {
    let message = message.to_lowercase();

    if message.contains(ALREADY_EXISTS) {
        return OutcomeStatus::ToleratedSkip(SkipReason::AlreadyExists);
    }

    if message.contains(DOES_NOT_EXIST) {
        match statement {
            Some(sql) if sql.to_lowercase().contains(DROP_KEYWORD) => {
                return OutcomeStatus::ToleratedSkip(SkipReason::DropTargetMissing);
            }
            None => return OutcomeStatus::ToleratedSkip(SkipReason::ObjectMissing),
            Some(_) => {}
        }
    }

    OutcomeStatus::Failed
}
