// src/error.rs
use thiserror::Error;

/// Failures while loading or validating grammar tables.
///
/// These are the only errors the crate returns: lexing and parsing never fail,
/// they report problems as error tokens and error nodes instead.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON table asset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid UTF-8 in compact tables: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("bad magic in compact tables .bin")]
    BadMagic,

    #[error("not a tabula grammar asset (format {0:?})")]
    UnknownFormat(String),

    #[error("unsupported table version {found} (this build reads {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("truncated compact tables: {0}")]
    Truncated(&'static str),

    #[error("{what} exceeds the compact format limit")]
    Overflow { what: &'static str },

    #[error("invalid char U+{0:04X} in compact tables")]
    InvalidChar(u32),

    #[error("{what} {id} out of range (limit {limit})")]
    OutOfRange {
        what: &'static str,
        id: usize,
        limit: usize,
    },

    #[error("symbol {name:?} ({id}) must be {expected}")]
    WrongKind {
        name: String,
        id: u16,
        expected: &'static str,
    },

    #[error("non-terminals must occupy ids 0..{count}, but {name:?} ({id}) does not")]
    Layout { name: String, id: u16, count: u16 },

    #[error("duplicate symbol name {0:?}")]
    DuplicateName(String),

    #[error("block end for {0:?} has an empty terminator")]
    EmptyTerminator(String),

    #[error("LL(1) row {row:?} references rule {rule} whose left side is {lhs:?}")]
    RuleMismatch { row: String, rule: u16, lhs: String },

    #[error("grammar {0:?} has no LL(1) table")]
    MissingLlTable(String),

    #[error("grammar {0:?} has no LALR(1) table")]
    MissingLalrTable(String),
}
