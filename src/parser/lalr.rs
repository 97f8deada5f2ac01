// src/parser/lalr.rs
// Shift-reduce LALR(1) engine over a stack of automaton states.

use super::{ParseEngine, ParseEvent, SyntaxError, lookahead::Lookahead};
use crate::{
    error::TableError,
    lexer::Position,
    tables::{Action, GrammarTables, LalrTable, RuleId, StateId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Accepted,
    Done,
}

pub struct ShiftReduceParser<'g, 'src> {
    tables: &'g GrammarTables,
    lalr: &'g LalrTable,
    input: Lookahead<'g, 'src>,
    states: Vec<StateId>,
    event: ParseEvent<'src>,
    phase: Phase,
}

impl<'g, 'src> ShiftReduceParser<'g, 'src> {
    /// Fails only when the grammar carries no LALR(1) table.
    pub fn new(tables: &'g GrammarTables, input: &'src str) -> Result<Self, TableError> {
        let lalr = tables.lalr()?;
        Ok(Self {
            tables,
            lalr,
            input: Lookahead::new(tables, input, false),
            states: vec![lalr.initial],
            event: ParseEvent::Initial,
            phase: Phase::Running,
        })
    }

    /// Surface hidden tokens (whitespace, comments) as `Shift` events.
    pub fn with_hidden(mut self, on: bool) -> Self {
        self.input.set_show_hidden(on);
        self
    }

    /// Current automaton state.
    pub fn state(&self) -> StateId {
        self.states.last().copied().unwrap_or(self.lalr.initial)
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    fn set(&mut self, event: ParseEvent<'src>) -> bool {
        log::trace!("[lalr] state={} {:?}", self.state(), event);
        let more = event != ParseEvent::EndDocument;
        self.event = event;
        more
    }

    fn reduce(&mut self, rule: RuleId) -> bool {
        let Some(r) = self.tables.rule(rule) else {
            return self.give_up();
        };
        let keep = self.states.len().saturating_sub(r.rhs.len());
        self.states.truncate(keep);
        match self.states.last().and_then(|&s| self.lalr.goto(s, r.lhs)) {
            Some(target) => {
                self.states.push(target);
                self.set(ParseEvent::Reduce(rule))
            }
            None => self.give_up(),
        }
    }

    fn recover(&mut self) -> bool {
        let lalr = self.lalr;
        let top = self.state();
        let err = self
            .input
            .recover(lalr.expected(top), |t| lalr.action(top, t).is_some());
        let eos = self.tables.end_of_stream;
        if self.input.at_end() && lalr.action(top, eos).is_none() {
            log::debug!("[lalr] no recovery from state {top} before end of input");
            self.phase = Phase::Done;
        }
        self.set(ParseEvent::Error(err))
    }

    /// Broken goto entry: nothing sensible left to do but end the document.
    fn give_up(&mut self) -> bool {
        log::debug!("[lalr] missing goto in state {}", self.state());
        self.phase = Phase::Done;
        let err = SyntaxError {
            text: "",
            position: self.input.position(),
            expected: Vec::new(),
        };
        self.set(ParseEvent::Error(err))
    }
}

impl<'g, 'src> ParseEngine<'src> for ShiftReduceParser<'g, 'src> {
    fn tables(&self) -> &GrammarTables {
        self.tables
    }

    fn read(&mut self) -> bool {
        match self.phase {
            Phase::Running => {}
            Phase::Accepted | Phase::Done => {
                self.phase = Phase::Done;
                return self.set(ParseEvent::EndDocument);
            }
        }
        if let Some(tok) = self.input.next_hidden() {
            return self.set(ParseEvent::Shift(tok));
        }

        let la = self.input.current();
        match self.lalr.action(self.state(), la.symbol) {
            Some(Action::Accept) if self.input.at_end() => {
                self.phase = Phase::Accepted;
                self.set(ParseEvent::Accept)
            }
            Some(Action::Shift(target)) => {
                self.states.push(target);
                self.input.advance();
                self.set(ParseEvent::Shift(la))
            }
            Some(Action::Reduce(rule)) => self.reduce(rule),
            Some(Action::Accept) | None => self.recover(),
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
        self.states.clear();
        self.states.push(self.lalr.initial);
        self.event = ParseEvent::Initial;
        self.phase = Phase::Running;
    }
}
