//! Line-oriented statement splitter

use serde::{Deserialize, Serialize};

/// Token that opens and closes a procedure body
const DOLLAR_QUOTE: &str = "$$";

/// Trimmed line ending that closes a procedure definition
const PROCEDURE_TERMINATOR: &str = "$$;";

const STATEMENT_TERMINATOR: char = ';';

const LINE_COMMENT: &str = "--";

/// Kind of an executable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A plain semicolon-terminated statement
    Simple,
    /// A complete `CREATE PROCEDURE` block, including its `$$` body
    ProcedureBody,
}

/// One independently executable piece of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementUnit {
    /// 1-based position of this unit within its file
    pub ordinal: usize,
    pub kind: UnitKind,
    /// 1-based line number of the first non-blank line of the unit
    pub start_line: usize,
    /// SQL text of the unit
    pub text: String,
}

/// Output of [`split`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    /// Units in source order
    pub units: Vec<StatementUnit>,
    /// The input ended inside a procedure definition
    ///
    /// Whatever was buffered is still returned as the last unit.
    pub incomplete: bool,
}

impl SplitResult {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit texts in order
    pub fn texts(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.text.as_str()).collect()
    }
}

/// Where the splitter is relative to procedure definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OutsideProcedure,
    InsideProcedure { in_dollar_quote: bool },
}

struct Splitter<'a> {
    state: State,
    buffer: Vec<&'a str>,
    buffer_start_line: usize,
    units: Vec<StatementUnit>,
}

impl<'a> Splitter<'a> {
    fn new() -> Self {
        Self {
            state: State::OutsideProcedure,
            buffer: Vec::new(),
            buffer_start_line: 1,
            units: Vec::new(),
        }
    }

    fn feed(&mut self, line_number: usize, line: &'a str) {
        let trimmed = line.trim();

        if self.state == State::OutsideProcedure && starts_procedure(trimmed) {
            self.state = State::InsideProcedure {
                in_dollar_quote: false,
            };
        }

        if self.buffer.is_empty() {
            self.buffer_start_line = line_number;
        }
        self.buffer.push(line);

        match self.state {
            State::InsideProcedure { in_dollar_quote } => {
                let in_dollar_quote = if line.matches(DOLLAR_QUOTE).count() % 2 == 1 {
                    !in_dollar_quote
                } else {
                    in_dollar_quote
                };

                if !in_dollar_quote && trimmed.ends_with(PROCEDURE_TERMINATOR) {
                    self.flush_procedure();
                    self.state = State::OutsideProcedure;
                } else {
                    self.state = State::InsideProcedure { in_dollar_quote };
                }
            }
            State::OutsideProcedure => {
                if trimmed.ends_with(STATEMENT_TERMINATOR) {
                    self.flush_simple(UnitKind::Simple);
                }
            }
        }
    }

    /// Emit a procedure block with its line content untouched
    fn flush_procedure(&mut self) {
        let lines = std::mem::take(&mut self.buffer);
        let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
            return;
        };
        let last = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .unwrap_or(first);

        let text = lines[first..=last].join("\n");
        self.push(UnitKind::ProcedureBody, self.buffer_start_line + first, text);
    }

    /// Emit the trimmed buffer unless it is blank or opens with a comment
    ///
    /// A statement whose trimmed text starts with `--` is dropped together
    /// with any SQL that follows the comment.
    fn flush_simple(&mut self, kind: UnitKind) {
        let lines = std::mem::take(&mut self.buffer);
        let joined = lines.join("\n");
        let text = joined.trim();
        if text.is_empty() || text.starts_with(LINE_COMMENT) {
            return;
        }

        let leading_blank = lines.iter().take_while(|l| l.trim().is_empty()).count();
        self.push(kind, self.buffer_start_line + leading_blank, text.to_string());
    }

    fn push(&mut self, kind: UnitKind, start_line: usize, text: String) {
        self.units.push(StatementUnit {
            ordinal: self.units.len() + 1,
            kind,
            start_line,
            text,
        });
    }

    fn finish(mut self) -> SplitResult {
        let incomplete = matches!(self.state, State::InsideProcedure { .. });
        if !self.buffer.is_empty() {
            let kind = if incomplete {
                UnitKind::ProcedureBody
            } else {
                UnitKind::Simple
            };
            self.flush_simple(kind);
        }

        SplitResult {
            units: self.units,
            incomplete,
        }
    }
}

/// Split a SQL script into executable units
///
/// Never fails: a script that ends in the middle of a procedure yields what
/// was buffered as a final [`UnitKind::ProcedureBody`] unit and sets
/// [`SplitResult::incomplete`].
pub fn split(sql: &str) -> SplitResult {
    let mut splitter = Splitter::new();
    for (idx, line) in sql.split('\n').enumerate() {
        splitter.feed(idx + 1, line);
    }

    let result = splitter.finish();
    tracing::trace!(
        units = result.units.len(),
        incomplete = result.incomplete,
        "split script"
    );
    result
}

/// Split a SQL script and return only the statement texts
pub fn split_statements(sql: &str) -> Vec<String> {
    split(sql).units.into_iter().map(|u| u.text).collect()
}

fn starts_procedure(trimmed_line: &str) -> bool {
    let upper = trimmed_line.to_uppercase();
    upper.contains("CREATE") && upper.contains("PROCEDURE")
}
