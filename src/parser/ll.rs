// src/parser/ll.rs
// Predictive LL(1) engine: a pushdown stack of pending grammar symbols and
// end-of-rule markers, expanded by table lookup on one token of lookahead.

use super::{ParseEngine, ParseEvent, lookahead::Lookahead};
use crate::{
    error::TableError,
    lexer::Position,
    tables::{GrammarTables, LlTable, RuleId, SymbolId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Symbol(SymbolId),
    /// Closes the non-terminal opened by expanding this rule.
    End(RuleId),
}

pub struct PredictiveParser<'g, 'src> {
    tables: &'g GrammarTables,
    ll: &'g LlTable,
    input: Lookahead<'g, 'src>,
    stack: Vec<Pending>,
    event: ParseEvent<'src>,
    finished: bool,
}

impl<'g, 'src> PredictiveParser<'g, 'src> {
    /// Fails only when the grammar carries no LL(1) table.
    pub fn new(tables: &'g GrammarTables, input: &'src str) -> Result<Self, TableError> {
        let ll = tables.ll()?;
        Ok(Self {
            tables,
            ll,
            input: Lookahead::new(tables, input, false),
            stack: vec![Pending::Symbol(tables.start_symbol)],
            event: ParseEvent::Initial,
            finished: false,
        })
    }

    /// Surface hidden tokens (whitespace, comments) as `Terminal` events.
    pub fn with_hidden(mut self, on: bool) -> Self {
        self.input.set_show_hidden(on);
        self
    }

    /// Pending symbols, bottom first. Empty once the start symbol is complete.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn set(&mut self, event: ParseEvent<'src>) -> bool {
        log::trace!("[ll] {:?}", event);
        let more = event != ParseEvent::EndDocument;
        self.event = event;
        more
    }

    fn expand(&mut self, nonterminal: SymbolId) -> bool {
        let ll = self.ll;
        let la = self.input.current();
        match ll.get(nonterminal, la.symbol) {
            Some(rule) => {
                self.stack.pop();
                self.stack.push(Pending::End(rule));
                if let Some(r) = self.tables.rule(rule) {
                    self.stack
                        .extend(r.rhs.iter().rev().map(|&s| Pending::Symbol(s)));
                }
                self.set(ParseEvent::NonTerminal(rule))
            }
            None => {
                let err = self
                    .input
                    .recover(ll.expected(nonterminal), |t| ll.get(nonterminal, t).is_some());
                if ll.get(nonterminal, self.input.current().symbol).is_none() {
                    log::debug!("[ll] dropping {}", self.tables.name(nonterminal));
                    self.stack.pop();
                }
                self.set(ParseEvent::Error(err))
            }
        }
    }

    fn match_terminal(&mut self, terminal: SymbolId) -> bool {
        let la = self.input.current();
        if la.symbol == terminal {
            self.stack.pop();
            self.input.advance();
            return self.set(ParseEvent::Terminal(la));
        }
        let err = self.input.recover(vec![terminal], |t| t == terminal);
        if self.input.current().symbol != terminal {
            log::debug!("[ll] dropping {}", self.tables.name(terminal));
            self.stack.pop();
        }
        self.set(ParseEvent::Error(err))
    }
}

impl<'g, 'src> ParseEngine<'src> for PredictiveParser<'g, 'src> {
    fn tables(&self) -> &GrammarTables {
        self.tables
    }

    fn read(&mut self) -> bool {
        if self.finished {
            return self.set(ParseEvent::EndDocument);
        }
        // Close finished rules before looking at the input, so hidden tokens
        // land in the enclosing non-terminal.
        let top = match self.stack.last().copied() {
            Some(Pending::End(rule)) => {
                self.stack.pop();
                return self.set(ParseEvent::EndNonTerminal(rule));
            }
            Some(Pending::Symbol(s)) => Some(s),
            None => None,
        };
        if let Some(tok) = self.input.next_hidden() {
            return self.set(ParseEvent::Terminal(tok));
        }

        match top {
            Some(s) if self.tables.is_nonterminal(s) => self.expand(s),
            Some(s) => self.match_terminal(s),
            None if self.input.at_end() => {
                self.finished = true;
                self.set(ParseEvent::EndDocument)
            }
            None => {
                // Start symbol complete but input remains.
                let eos = self.tables.end_of_stream;
                let err = self.input.recover(vec![eos], |_| false);
                self.set(ParseEvent::Error(err))
            }
        }
    }

    fn event(&self) -> &ParseEvent<'src> {
        &self.event
    }

    fn position(&self) -> Position {
        self.input.position()
    }

    fn restart(&mut self, input: &'src str) {
        self.input.restart(input);
        self.stack.clear();
        self.stack.push(Pending::Symbol(self.tables.start_symbol));
        self.event = ParseEvent::Initial;
        self.finished = false;
    }
}
