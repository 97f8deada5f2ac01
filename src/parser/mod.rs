// src/parser/mod.rs
// Table-driven parse engines. Both strategies pull tokens on demand and report
// one event per `read()`; the tree builder consumes either through
// [`ParseEngine`].

pub mod lalr;
pub mod ll;
mod lookahead;

pub use lalr::ShiftReduceParser;
pub use ll::PredictiveParser;

use crate::{
    lexer::{Position, Token},
    tables::{GrammarTables, RuleId, SymbolId},
};

/// Kind of the current event, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Initial,
    Terminal,
    NonTerminal,
    EndNonTerminal,
    Shift,
    Reduce,
    Accept,
    Error,
    EndDocument,
}

/// Span skipped by panic-mode recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError<'src> {
    /// Raw input covered by the skipped tokens, hidden ones included. Empty
    /// when recovery stood at end of input.
    pub text: &'src str,
    pub position: Position,
    /// Terminals that would have been accepted where the error was detected.
    pub expected: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent<'src> {
    Initial,
    /// LL(1): a terminal was matched, or a hidden token surfaced.
    Terminal(Token<'src>),
    /// LL(1): a non-terminal was expanded with this rule.
    NonTerminal(RuleId),
    /// LL(1): the rule opened by the matching `NonTerminal` is complete.
    EndNonTerminal(RuleId),
    /// LALR(1): a token was shifted, or a hidden token surfaced.
    Shift(Token<'src>),
    /// LALR(1): the rule's right side was replaced by its left side.
    Reduce(RuleId),
    Accept,
    Error(SyntaxError<'src>),
    EndDocument,
}

impl ParseEvent<'_> {
    pub fn node_type(&self) -> NodeType {
        match self {
            ParseEvent::Initial => NodeType::Initial,
            ParseEvent::Terminal(_) => NodeType::Terminal,
            ParseEvent::NonTerminal(_) => NodeType::NonTerminal,
            ParseEvent::EndNonTerminal(_) => NodeType::EndNonTerminal,
            ParseEvent::Shift(_) => NodeType::Shift,
            ParseEvent::Reduce(_) => NodeType::Reduce,
            ParseEvent::Accept => NodeType::Accept,
            ParseEvent::Error(_) => NodeType::Error,
            ParseEvent::EndDocument => NodeType::EndDocument,
        }
    }

    /// Symbol the event is about: the token's, the rule's left side, or the
    /// error symbol.
    pub fn symbol(&self, tables: &GrammarTables) -> Option<SymbolId> {
        match self {
            ParseEvent::Terminal(t) | ParseEvent::Shift(t) => Some(t.symbol),
            ParseEvent::NonTerminal(r) | ParseEvent::EndNonTerminal(r) | ParseEvent::Reduce(r) => {
                tables.rule(*r).map(|rule| rule.lhs)
            }
            ParseEvent::Error(_) => Some(tables.error),
            ParseEvent::Initial | ParseEvent::Accept | ParseEvent::EndDocument => None,
        }
    }

    /// Raw text carried by token and error events.
    pub fn value(&self) -> Option<&str> {
        match self {
            ParseEvent::Terminal(t) | ParseEvent::Shift(t) => Some(t.text),
            ParseEvent::Error(e) => Some(e.text),
            _ => None,
        }
    }
}

/// Pull-based parse engine. One instance parses one input at a time;
/// `restart` rebinds it without touching the grammar tables.
pub trait ParseEngine<'src> {
    fn tables(&self) -> &GrammarTables;

    /// Advances to the next event. Returns `false` once the document has
    /// ended; the current event is then [`ParseEvent::EndDocument`].
    fn read(&mut self) -> bool;

    fn event(&self) -> &ParseEvent<'src>;

    /// Position of the current lookahead token.
    fn position(&self) -> Position;

    fn restart(&mut self, input: &'src str);

    fn node_type(&self) -> NodeType {
        self.event().node_type()
    }
}
