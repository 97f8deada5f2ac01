// src/tree/builder.rs
// Drives a parse engine to completion and assembles its events into a tree.
// The same code serves both strategies: LL(1) brackets rules with
// NonTerminal/EndNonTerminal, LALR(1) reports finished rules with Reduce.

use super::ParseNode;
use crate::{
    lexer::{Position, Token},
    parser::{ParseEngine, ParseEvent, SyntaxError},
    tables::{GrammarTables, RuleId, SymbolId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Idle,
    Building,
    Done,
}

/// An LL(1) rule whose children are still arriving.
struct Frame {
    rule: RuleId,
    base: usize,
    at: Position,
}

#[derive(Debug)]
pub struct TreeBuilder {
    /// Don't wrap a single child in a node for a one-symbol rule.
    pub trim: bool,
    /// Splice collapsed nodes into their parent and apply symbol substitution.
    pub transform: bool,
    state: BuilderState,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl TreeBuilder {
    pub fn new(trim: bool, transform: bool) -> Self {
        Self {
            trim,
            transform,
            state: BuilderState::Idle,
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Reads `engine` until it reports the end of the document. Returns `None`
    /// when nothing but an empty start symbol was recognised.
    pub fn build<'src, E>(&mut self, engine: &mut E) -> Option<ParseNode>
    where
        E: ParseEngine<'src> + ?Sized,
    {
        self.state = BuilderState::Building;
        let mut nodes: Vec<ParseNode> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        // End of the last leaf; empty rules sit here so spans stay tight.
        let mut last = Position::START;

        while engine.read() {
            let tables = engine.tables();
            match engine.event() {
                ParseEvent::Initial | ParseEvent::Accept | ParseEvent::EndDocument => {}
                ParseEvent::Terminal(tok) | ParseEvent::Shift(tok) => {
                    last = tok.position().after(tok.text);
                    nodes.push(self.leaf(tables, tok));
                }
                ParseEvent::Error(err) => {
                    last = err.position.after(err.text);
                    nodes.push(error_leaf(tables, err));
                }
                ParseEvent::NonTerminal(rule) => frames.push(Frame {
                    rule: *rule,
                    base: nodes.len(),
                    at: last,
                }),
                ParseEvent::EndNonTerminal(rule) => {
                    let Some(frame) = frames.pop() else {
                        log::debug!("[tree] unbalanced end of rule {}", rule.0);
                        continue;
                    };
                    let children = nodes.split_off(frame.base.min(nodes.len()));
                    nodes.push(self.node(tables, frame.rule, children, frame.at));
                }
                ParseEvent::Reduce(rule) => {
                    let rhs = tables.rule(*rule).map_or(0, |r| r.rhs.len());
                    self.reduce(tables, &mut nodes, *rule, rhs, last);
                }
            }
        }

        let tables = engine.tables();
        // Frames still open when the engine stopped early.
        while let Some(frame) = frames.pop() {
            let children = nodes.split_off(frame.base.min(nodes.len()));
            nodes.push(self.node(tables, frame.rule, children, frame.at));
        }
        let root = self.finish(tables, nodes, last);
        self.state = BuilderState::Done;
        root
    }

    /// Pops the right side of `rule` off `nodes`. Hidden and error nodes have
    /// no automaton state, so they don't count towards the right side; those
    /// between its symbols are attached, those after it stay on the stack.
    fn reduce(
        &self,
        tables: &GrammarTables,
        nodes: &mut Vec<ParseNode>,
        rule: RuleId,
        rhs: usize,
        at: Position,
    ) {
        if rhs == 0 {
            nodes.push(self.node(tables, rule, Vec::new(), at));
            return;
        }
        let mut end = nodes.len();
        while end > 0 && !is_structural(&nodes[end - 1]) {
            end -= 1;
        }
        let mut start = end;
        let mut seen = 0;
        while start > 0 && seen < rhs {
            start -= 1;
            if is_structural(&nodes[start]) {
                seen += 1;
            }
        }
        let trailing = nodes.split_off(end);
        let children = nodes.split_off(start);
        nodes.push(self.node(tables, rule, children, at));
        nodes.extend(trailing);
    }

    fn node(
        &self,
        tables: &GrammarTables,
        rule: RuleId,
        mut children: Vec<ParseNode>,
        at: Position,
    ) -> ParseNode {
        let Some(r) = tables.rule(rule) else {
            return self.wrap(tables, tables.start_symbol, children, at);
        };
        if self.trim && r.rhs.len() == 1 && children.len() == 1 {
            let only = &children[0];
            if !only.is_leaf() || only.is_collapsed {
                if let Some(child) = children.pop() {
                    return child;
                }
            }
        }
        self.wrap(tables, r.lhs, children, at)
    }

    fn wrap(
        &self,
        tables: &GrammarTables,
        symbol: SymbolId,
        children: Vec<ParseNode>,
        at: Position,
    ) -> ParseNode {
        let children = if self.transform {
            splice_collapsed(children)
        } else {
            children
        };
        let collapsed = tables.symbol(symbol).is_some_and(|s| s.collapsed);
        let (symbol_id, substitute_for) = self.substitute(tables, symbol);
        let mut node = ParseNode::branch(
            tables.name(symbol_id).to_string(),
            symbol_id,
            collapsed,
            children,
            at,
        );
        node.substitute_for = substitute_for;
        node
    }

    fn leaf(&self, tables: &GrammarTables, tok: &Token<'_>) -> ParseNode {
        let meta = tables.symbol(tok.symbol);
        let (symbol_id, substitute_for) = self.substitute(tables, tok.symbol);
        ParseNode {
            symbol: tables.name(symbol_id).to_string(),
            symbol_id,
            value: Some(tok.text.to_string()),
            children: Vec::new(),
            is_hidden: tables.is_hidden(tok.symbol),
            is_collapsed: meta.is_some_and(|m| m.collapsed),
            is_error: tok.symbol == tables.error,
            substitute_for,
            line: tok.line,
            column: tok.column,
            offset: tok.offset,
            length: tok.len(),
        }
    }

    /// Symbol a node reports, plus the original name when transform replaced it.
    fn substitute(
        &self,
        tables: &GrammarTables,
        symbol: SymbolId,
    ) -> (SymbolId, Option<String>) {
        match tables.symbol(symbol).and_then(|m| m.substitute) {
            Some(sub) if self.transform => (sub, Some(tables.name(symbol).to_string())),
            _ => (symbol, None),
        }
    }

    /// One root out of whatever is left. A single structural non-terminal
    /// absorbs its hidden and error neighbours; anything else (the engine
    /// gave up mid-way) goes under a synthetic start-symbol node.
    fn finish(
        &self,
        tables: &GrammarTables,
        mut nodes: Vec<ParseNode>,
        at: Position,
    ) -> Option<ParseNode> {
        let structural: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| is_structural(n))
            .map(|(i, _)| i)
            .collect();

        let root = match structural.as_slice() {
            [] if nodes.is_empty() => return None,
            &[i] if nodes.len() == 1 && !nodes[i].is_leaf() => nodes.pop()?,
            &[i] if !nodes[i].is_leaf() => {
                let after = nodes.split_off(i + 1);
                let mut root = nodes.pop()?;
                let mut children = nodes;
                children.append(&mut root.children);
                children.extend(after);
                root.children = children;
                root.update_span();
                root
            }
            _ => self.wrap(tables, tables.start_symbol, nodes, at),
        };

        if root.children.is_empty() && !root.is_leaf() {
            return None;
        }
        Some(root)
    }
}

#[inline]
fn is_structural(n: &ParseNode) -> bool {
    !n.is_hidden && !n.is_error
}

fn error_leaf(tables: &GrammarTables, err: &SyntaxError<'_>) -> ParseNode {
    ParseNode {
        symbol: tables.name(tables.error).to_string(),
        symbol_id: tables.error,
        value: Some(err.text.to_string()),
        children: Vec::new(),
        is_hidden: false,
        is_collapsed: false,
        is_error: true,
        substitute_for: None,
        line: err.position.line,
        column: err.position.column,
        offset: err.position.offset,
        length: err.text.len(),
    }
}

/// Replaces collapsed inner nodes by their children. Children were built with
/// the same rule, so one level is enough.
fn splice_collapsed(children: Vec<ParseNode>) -> Vec<ParseNode> {
    if !children.iter().any(|c| c.is_collapsed && !c.is_leaf()) {
        return children;
    }
    let mut out = Vec::with_capacity(children.len());
    for mut c in children {
        if c.is_collapsed && !c.is_leaf() {
            out.append(&mut c.children);
        } else {
            out.push(c);
        }
    }
    out
}
