//! SQLite session driver
//!
//! A local stand-in for a warehouse session: one connection serves every
//! call, so session state survives across `run_statement` calls as well.

mod driver;
#[cfg(test)]
mod driver_tests;
mod session;

pub use driver::SqliteDriver;
pub use session::SqliteSession;
