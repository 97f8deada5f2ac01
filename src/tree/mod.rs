// src/tree/mod.rs
pub mod builder;
pub mod literal;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

pub use builder::{BuilderState, TreeBuilder};
pub use literal::Literal;

use crate::{lexer::Position, tables::SymbolId};

/// A parse tree node. Leaves (terminals and errors) carry `value`; inner
/// nodes carry `children` and take their span from the first and last child.
///
/// Nesting follows the input, so traversal, comparison and drop all run on
/// an explicit stack instead of recursing.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseNode {
    pub symbol: String,
    pub symbol_id: SymbolId,
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseNode>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_hidden: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_collapsed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
    /// Original symbol name when the grammar substituted this node's symbol.
    pub substitute_for: Option<String>,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
    pub length: usize,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ParseNode {
    /// Inner node spanning `children`; empty nodes sit at `at` with length 0.
    pub(crate) fn branch(
        symbol: String,
        symbol_id: SymbolId,
        is_collapsed: bool,
        children: Vec<ParseNode>,
        at: Position,
    ) -> Self {
        let mut node = ParseNode {
            symbol,
            symbol_id,
            value: None,
            children,
            is_hidden: false,
            is_collapsed,
            is_error: false,
            substitute_for: None,
            line: at.line,
            column: at.column,
            offset: at.offset,
            length: 0,
        };
        node.update_span();
        node
    }

    /// Re-derives location and length from the children. No-op for leaves and
    /// childless nodes.
    pub(crate) fn update_span(&mut self) {
        if self.value.is_some() {
            return;
        }
        let (Some(first), Some(last)) = (self.children.first(), self.children.last()) else {
            return;
        };
        self.line = first.line;
        self.column = first.column;
        self.offset = first.offset;
        self.length = (last.offset + last.length).saturating_sub(first.offset);
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Leaves in source order.
    pub fn leaves(&self) -> Vec<&ParseNode> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if n.is_leaf() {
                out.push(n);
            }
        });
        out
    }

    pub fn errors(&self) -> Vec<&ParseNode> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if n.is_error {
                out.push(n);
            }
        });
        out
    }

    pub fn has_errors(&self) -> bool {
        self.first(|n| n.is_error).is_some()
    }

    /// First node named `symbol`, pre-order.
    pub fn find(&self, symbol: &str) -> Option<&ParseNode> {
        self.first(|n| n.symbol == symbol)
    }

    fn first(&self, mut pred: impl FnMut(&ParseNode) -> bool) -> Option<&ParseNode> {
        let mut stack = vec![self];
        while let Some(n) = stack.pop() {
            if pred(n) {
                return Some(n);
            }
            stack.extend(n.children.iter().rev());
        }
        None
    }

    /// All nodes named `symbol`, pre-order.
    pub fn find_all(&self, symbol: &str) -> Vec<&ParseNode> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if n.symbol == symbol {
                out.push(n);
            }
        });
        out
    }

    /// Concatenated leaf values. Reproduces the input when the tree was
    /// built with hidden tokens visible.
    pub fn source_text(&self) -> String {
        let mut out = String::with_capacity(self.length);
        self.walk(&mut |n| {
            if let Some(v) = &n.value {
                out.push_str(v);
            }
        });
        out
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a ParseNode)) {
        let mut stack = vec![self];
        while let Some(n) = stack.pop() {
            f(n);
            stack.extend(n.children.iter().rev());
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Everything but the children.
    fn same_node(&self, other: &ParseNode) -> bool {
        self.symbol == other.symbol
            && self.symbol_id == other.symbol_id
            && self.value == other.value
            && self.is_hidden == other.is_hidden
            && self.is_collapsed == other.is_collapsed
            && self.is_error == other.is_error
            && self.substitute_for == other.substitute_for
            && self.line == other.line
            && self.column == other.column
            && self.offset == other.offset
            && self.length == other.length
            && self.children.len() == other.children.len()
    }

    fn fmt_line(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.symbol, indent = depth * 2)?;
        if let Some(v) = &self.value {
            write!(f, " {v:?}")?;
        }
        if let Some(orig) = &self.substitute_for {
            write!(f, " (for {orig})")?;
        }
        writeln!(f, " @{}:{}", self.line, self.column)
    }
}

impl PartialEq for ParseNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.same_node(b) {
                return false;
            }
            pending.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Eq for ParseNode {}

impl Drop for ParseNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            node.fmt_line(f, depth)?;
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
        Ok(())
    }
}
