//! sqlrun Core - Session abstractions shared by the runner and the drivers
//!
//! This crate provides the fundamental traits and types that all other
//! sqlrun crates depend on. It defines:
//!
//! - `Session` - The execution collaborator a script run is driven against
//! - `SessionDriver` - Trait for opening sessions from a `SessionConfig`
//! - Common types like `Value`, `RowSet` and `ObjectDescriptor`

mod driver;
mod error;
mod session;
mod types;

pub use driver::*;
pub use error::*;
pub use session::*;
pub use types::*;
