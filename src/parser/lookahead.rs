// src/parser/lookahead.rs
// One-token lookahead shared by both engines: hidden-token handling and the
// skip loop of panic-mode recovery.

use super::SyntaxError;
use crate::{
    lexer::{Position, Token, Tokenizer},
    tables::{GrammarTables, SymbolId},
};

pub(crate) struct Lookahead<'g, 'src> {
    lexer: Tokenizer<'g, 'src>,
    current: Token<'src>,
    show_hidden: bool,
}

impl<'g, 'src> Lookahead<'g, 'src> {
    pub fn new(tables: &'g GrammarTables, input: &'src str, show_hidden: bool) -> Self {
        let mut lexer = Tokenizer::new(tables, input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            show_hidden,
        }
    }

    pub fn restart(&mut self, input: &'src str) {
        self.lexer.restart(input);
        self.current = self.lexer.next_token();
    }

    pub fn set_show_hidden(&mut self, on: bool) {
        self.show_hidden = on;
    }

    #[inline]
    pub fn tables(&self) -> &'g GrammarTables {
        self.lexer.tables()
    }

    #[inline]
    pub fn current(&self) -> Token<'src> {
        self.current
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.current.position()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.symbol == self.tables().end_of_stream
    }

    #[inline]
    pub fn advance(&mut self) {
        if !self.at_end() {
            self.current = self.lexer.next_token();
        }
    }

    /// Consumes hidden tokens at the lookahead. Returns the first one when
    /// they are to be surfaced; otherwise drops them all and returns `None`.
    pub fn next_hidden(&mut self) -> Option<Token<'src>> {
        while self.tables().is_hidden(self.current.symbol) {
            let tok = self.current;
            self.advance();
            if self.show_hidden {
                return Some(tok);
            }
        }
        None
    }

    /// Panic mode: drops the offending lookahead and keeps dropping until
    /// `sync` accepts a token or input ends. The error spans everything
    /// dropped, up to the token recovery stopped at.
    pub fn recover(
        &mut self,
        expected: Vec<SymbolId>,
        mut sync: impl FnMut(SymbolId) -> bool,
    ) -> SyntaxError<'src> {
        let first = self.current;
        while !self.at_end() {
            self.advance();
            while self.tables().is_hidden(self.current.symbol) {
                self.advance();
            }
            if self.at_end() || sync(self.current.symbol) {
                break;
            }
        }
        let source = self.lexer.source();
        let text = &source[first.offset..self.current.offset];
        log::debug!(
            "[parse] skipped {:?} at {}:{}, resuming at {}",
            text,
            first.line,
            first.column,
            self.tables().name(self.current.symbol)
        );
        SyntaxError {
            text,
            position: first.position(),
            expected,
        }
    }
}
