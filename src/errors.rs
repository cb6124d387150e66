//! Typed error model shared by every compiler stage.
//!
//! Every failure aborts the whole compilation: there is no partial SQL and
//! no panic for a well-formed-but-unsatisfiable input (that is
//! [`CompileError::UnjoinableTables`], which callers can recover from).

use thiserror::Error;

/// A position within the GenQuery source text, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("unexpected character '{ch}' at {position}")]
    LexError { ch: char, position: Position },

    #[error("parse error at {position}: expected {expected}, found {found}")]
    ParseError {
        position: Position,
        expected: String,
        found: String,
    },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("unknown column in order-by clause: {0}")]
    UnknownColumnInOrderBy(String),

    #[error("aggregate functions are not allowed in the WHERE clause")]
    AggregateInWhereClause,

    #[error("could not find a join path connecting the required tables")]
    UnjoinableTables,

    #[error("the selection list must contain at least one column")]
    EmptySelectionList,

    #[error("invalid numeric literal for OFFSET/FETCH: {0}")]
    InvalidRangeValue(String),
}
