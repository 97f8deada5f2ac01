// src/lexer/token.rs
use serde::{Deserialize, Serialize};

use crate::tables::{GrammarTables, SymbolId};

/// Location of a char in the input: 1-based line and column (in chars),
/// 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };

    /// Where `text` ends when it starts here.
    pub fn after(mut self, text: &str) -> Position {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += text.len();
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

/// One lexeme. `text` borrows the input, so tokens are `Copy` and cheap to
/// buffer for lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub symbol: SymbolId,
    pub text: &'src str,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl<'src> Token<'src> {
    /// Byte length of the lexeme.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Owned form for dumps and golden files.
    pub fn summary(&self, tables: &GrammarTables) -> TokenSummary {
        TokenSummary {
            kind: tables.name(self.symbol).to_string(),
            text: self.text.to_string(),
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSummary {
    pub kind: String,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}
