//! Snowflake session driver
//!
//! Talks to the Snowflake SQL API v2 (`/api/v2/statements`). Every request
//! runs in its own server-side session, so session variables only survive
//! within a single [`run_script`](sqlrun_core::Session::run_script) call,
//! which submits the whole script as one multi-statement request.
//!
//! `USE WAREHOUSE|DATABASE|SCHEMA|ROLE` run through
//! [`run_statement`](sqlrun_core::Session::run_statement) is the exception:
//! the selected object is sent as request context on every later call.

mod config;
mod context;
mod driver;
#[cfg(test)]
mod driver_tests;
mod protocol;
mod session;

pub use config::{SnowflakeSettings, TokenType};
pub use context::SessionContext;
pub use driver::SnowflakeDriver;
pub use protocol::ErrorBody;
pub use session::SnowflakeSession;
