// ABOUTME: Typed errors for the recoverable parts of the dump transform
// ABOUTME: Statement parse failures and schema mismatches never abort a rewrite

use thiserror::Error;

/// Why a span starting with `INSERT INTO` could not be read as a statement.
///
/// Offsets are byte offsets into the text handed to the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("expected keyword {keyword} at byte {offset}")]
    ExpectedKeyword {
        keyword: &'static str,
        offset: usize,
    },

    #[error("expected {expected} at byte {offset}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: char,
        offset: usize,
    },

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("unterminated quoted literal starting at byte {0}")]
    UnterminatedLiteral(usize),

    #[error("empty value tuple at byte {0}")]
    EmptyTuple(usize),

    #[error("text after statement terminator at byte {0}")]
    TrailingText(usize),
}

/// Disagreement between the column schema and what a dump actually contains,
/// or an invalid schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema must define at least one column")]
    Empty,

    #[error("column {0} has an empty source or destination name")]
    BlankName(usize),

    #[error("source column '{0}' is mapped more than once")]
    DuplicateSource(String),

    #[error("destination field '{0}' is produced more than once")]
    DuplicateDestination(String),

    #[error("row {row} has {found} values, schema expects {expected}")]
    CellCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("statement declares {found} columns, schema expects {expected}")]
    DeclaredColumnCount { expected: usize, found: usize },

    #[error("declared column {position} is '{found}', schema expects '{expected}'")]
    DeclaredColumn {
        position: usize,
        expected: String,
        found: String,
    },
}
