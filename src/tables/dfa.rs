// src/tables/dfa.rs
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{StateId, SymbolId};

/// One outgoing edge: taken when the current char falls in any of `ranges`
/// (inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfaEdge {
    pub ranges: Vec<(char, char)>,
    pub target: StateId,
}

impl DfaEdge {
    #[inline]
    pub fn matches(&self, ch: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= ch && ch <= hi)
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfaState {
    /// Terminal reported when scanning stops in this state.
    #[serde(default)]
    pub accept: Option<SymbolId>,
    #[serde(default)]
    pub edges: Vec<DfaEdge>,
}

impl DfaState {
    /// Edges are tried in table order; the first match wins.
    #[inline]
    pub fn step(&self, ch: char) -> Option<StateId> {
        self.edges.iter().find(|e| e.matches(ch)).map(|e| e.target)
    }
}

/// Compiled character automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharDfa {
    #[serde(default)]
    pub initial: StateId,
    pub states: Vec<DfaState>,
}

impl CharDfa {
    #[inline]
    pub fn state(&self, id: StateId) -> Option<&DfaState> {
        self.states.get(id as usize)
    }
}

/// Literal bodies the automaton cannot delimit on its own (quoted strings):
/// after `symbol` is accepted, raw input is appended until `terminator`
/// occurs contiguously. The char following `escape` never starts a terminator.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnd {
    pub symbol: SymbolId,
    pub terminator: String,
    #[serde(default)]
    pub escape: Option<char>,
}

impl BlockEnd {
    /// Byte length of the body in `rest`, terminator included, or `None` if
    /// `rest` ends first.
    pub fn scan(&self, rest: &str) -> Option<usize> {
        let mut chars = rest.char_indices();
        while let Some((i, ch)) = chars.next() {
            if Some(ch) == self.escape {
                chars.next();
                continue;
            }
            if rest[i..].starts_with(self.terminator.as_str()) {
                return Some(i + self.terminator.len());
            }
        }
        None
    }
}
