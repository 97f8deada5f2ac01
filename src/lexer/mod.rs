// src/lexer/mod.rs
pub mod token;
pub mod tokenizer;

pub use token::{Position, Token, TokenSummary};
pub use tokenizer::{Tokenizer, Tokens};

use crate::tables::GrammarTables;

/// Lazy tokens of `input`, ending with the end-of-stream token.
pub fn tokenize<'g, 'src>(tables: &'g GrammarTables, input: &'src str) -> Tokens<'g, 'src> {
    Tokenizer::new(tables, input).tokens()
}
