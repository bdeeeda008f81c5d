//! SQL statement splitting
//!
//! Splits a script into statements line by line. Statements end at a line
//! whose trimmed text ends with `;`, except inside a stored procedure, which
//! starts at a line mentioning both `CREATE` and `PROCEDURE` and ends at a
//! `$$;` line outside of a dollar-quoted body.
//!
//! The splitter is keyword driven, not a SQL lexer. Semicolons inside string
//! literals outside procedures still end a statement, and any line that
//! happens to contain both procedure keywords opens a procedure block.

mod splitter;

pub use splitter::{SplitResult, StatementUnit, UnitKind, split, split_statements};
