// src/lexer/tokenizer.rs
// Maximal-munch walk over the grammar's char DFA. Never fails: anything the
// automaton rejects comes out as a token tagged with the error symbol.

use super::token::{Position, Token};
use crate::tables::{GrammarTables, SymbolId};

pub struct Tokenizer<'g, 'src> {
    tables: &'g GrammarTables,
    input: &'src str,
    pos: Position,
}

impl<'g, 'src> Tokenizer<'g, 'src> {
    pub fn new(tables: &'g GrammarTables, input: &'src str) -> Self {
        Self {
            tables,
            input,
            pos: Position::START,
        }
    }

    /// Rebinds to `input` and rewinds to line 1, column 1.
    pub fn restart(&mut self, input: &'src str) {
        self.input = input;
        self.pos = Position::START;
    }

    #[inline]
    pub fn tables(&self) -> &'g GrammarTables {
        self.tables
    }

    #[inline]
    pub fn source(&self) -> &'src str {
        self.input
    }

    /// Where the next token will start.
    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos.offset >= self.input.len()
    }

    /// Scans one token. Once the input is exhausted every call returns the
    /// end-of-stream token (empty text at the end position).
    pub fn next_token(&mut self) -> Token<'src> {
        let input = self.input;
        let start = self.pos.offset;
        if start >= input.len() {
            return self.emit(self.tables.end_of_stream, &input[input.len()..]);
        }

        let rest = &input[start..];
        let (mut symbol, mut end) = self.munch(rest);

        if symbol != self.tables.error {
            if let Some(block) = self.tables.block_end(symbol) {
                match block.scan(&rest[end..]) {
                    Some(n) => end += n,
                    None => {
                        log::debug!(
                            "[lex] unterminated {} at {}:{}",
                            self.tables.name(symbol),
                            self.pos.line,
                            self.pos.column
                        );
                        symbol = self.tables.error;
                        end = rest.len();
                    }
                }
            }
        }

        self.emit(symbol, &rest[..end])
    }

    /// Longest run of chars the DFA accepts from its initial state. Reports the
    /// accept symbol of the state the walk stopped in; a walk that consumed
    /// nothing still takes one char so the caller always makes progress.
    fn munch(&self, rest: &str) -> (SymbolId, usize) {
        let dfa = &self.tables.dfa;
        let mut state = dfa.initial;
        let mut end = 0usize;
        for (i, ch) in rest.char_indices() {
            let Some(next) = dfa.state(state).and_then(|s| s.step(ch)) else {
                break;
            };
            state = next;
            end = i + ch.len_utf8();
        }

        if end == 0 {
            let width = rest.chars().next().map_or(0, char::len_utf8);
            return (self.tables.error, width);
        }
        let symbol = dfa
            .state(state)
            .and_then(|s| s.accept)
            .unwrap_or(self.tables.error);
        (symbol, end)
    }

    fn emit(&mut self, symbol: SymbolId, text: &'src str) -> Token<'src> {
        let tok = Token {
            symbol,
            text,
            line: self.pos.line,
            column: self.pos.column,
            offset: self.pos.offset,
        };
        self.pos = self.pos.after(text);
        log::trace!(
            "[lex] {} {:?} @{}:{}",
            self.tables.name(symbol),
            text,
            tok.line,
            tok.column
        );
        tok
    }

    /// Lazy token stream over the remaining input, ending with one
    /// end-of-stream token.
    pub fn tokens(self) -> Tokens<'g, 'src> {
        Tokens {
            inner: self,
            done: false,
        }
    }
}

pub struct Tokens<'g, 'src> {
    inner: Tokenizer<'g, 'src>,
    done: bool,
}

impl<'g, 'src> Tokens<'g, 'src> {
    /// Rewinds onto new input; the stream yields again.
    pub fn restart(&mut self, input: &'src str) {
        self.inner.restart(input);
        self.done = false;
    }
}

impl<'g, 'src> Iterator for Tokens<'g, 'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        if self.done {
            return None;
        }
        let tok = self.inner.next_token();
        if tok.symbol == self.inner.tables.end_of_stream {
            self.done = true;
        }
        Some(tok)
    }
}

impl std::iter::FusedIterator for Tokens<'_, '_> {}
