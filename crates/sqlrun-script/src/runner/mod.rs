//! Ordered script execution
//!
//! [`ScriptRunner`] executes a list of script files against one
//! [`Session`](sqlrun_core::Session), strictly in order. Each file runs either
//! as one session-preserving script or statement by statement, and every
//! failure is classified rather than propagated.

mod executor;

pub use executor::{
    ModeSelection, NoopObserver, RunObserver, RunOptions, ScriptFile, ScriptRunner, select_mode,
};
