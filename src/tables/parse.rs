// src/tables/parse.rs
// Dense parse tables. Columns are terminal ids shifted down by the
// non-terminal count; rows of the goto table are indexed by non-terminal id.

use serde::{Deserialize, Serialize};

use super::{RuleId, StateId, SymbolId};
use crate::error::TableError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Shift(StateId),
    Reduce(RuleId),
    Accept,
}

/// Sparse per-state form used by the asset formats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LalrStateDisk {
    #[serde(default)]
    pub actions: Vec<(SymbolId, Action)>,
    #[serde(default)]
    pub gotos: Vec<(SymbolId, StateId)>,
}

#[inline]
fn terminal_column(nonterminals: u16, width: usize, sym: SymbolId) -> Option<usize> {
    sym.0
        .checked_sub(nonterminals)
        .map(usize::from)
        .filter(|&c| c < width)
}

fn out_of_range(what: &'static str, id: usize, limit: usize) -> TableError {
    TableError::OutOfRange { what, id, limit }
}

/// LL(1) prediction table: `[non-terminal][terminal] -> rule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlTable {
    nonterminals: u16,
    width: usize,
    cells: Vec<Option<RuleId>>,
}

impl LlTable {
    pub(crate) fn from_entries(
        nonterminals: u16,
        terminals: usize,
        entries: &[(SymbolId, SymbolId, RuleId)],
    ) -> Result<Self, TableError> {
        let mut cells = vec![None; nonterminals as usize * terminals];
        for &(row, term, rule) in entries {
            if row.0 >= nonterminals {
                return Err(out_of_range("LL(1) row", row.index(), nonterminals as usize));
            }
            let col = terminal_column(nonterminals, terminals, term).ok_or_else(|| {
                out_of_range("LL(1) terminal", term.index(), nonterminals as usize + terminals)
            })?;
            cells[row.index() * terminals + col] = Some(rule);
        }
        Ok(Self {
            nonterminals,
            width: terminals,
            cells,
        })
    }

    /// Rule predicted for `nonterminal` on lookahead `terminal`.
    #[inline]
    pub fn get(&self, nonterminal: SymbolId, terminal: SymbolId) -> Option<RuleId> {
        if nonterminal.0 >= self.nonterminals {
            return None;
        }
        let col = terminal_column(self.nonterminals, self.width, terminal)?;
        self.cells[nonterminal.index() * self.width + col]
    }

    /// Terminals with an entry in `nonterminal`'s row.
    pub fn expected(&self, nonterminal: SymbolId) -> Vec<SymbolId> {
        if nonterminal.0 >= self.nonterminals {
            return Vec::new();
        }
        let row = &self.cells[nonterminal.index() * self.width..][..self.width];
        row.iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(|(col, _)| SymbolId(self.nonterminals + col as u16))
            .collect()
    }

    /// `(row, column, rule)` for every filled cell, row-major.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, RuleId)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.map(|rule| (i / self.width.max(1), i % self.width.max(1), rule))
        })
    }

    pub(crate) fn to_disk(&self) -> Vec<(SymbolId, SymbolId, RuleId)> {
        self.entries()
            .map(|(row, col, rule)| {
                (
                    SymbolId(row as u16),
                    SymbolId(self.nonterminals + col as u16),
                    rule,
                )
            })
            .collect()
    }
}

/// LALR(1) action and goto tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LalrTable {
    pub initial: StateId,
    states: usize,
    nonterminals: u16,
    width: usize,
    actions: Vec<Option<Action>>,
    gotos: Vec<Option<StateId>>,
}

impl LalrTable {
    pub(crate) fn from_states(
        nonterminals: u16,
        terminals: usize,
        initial: StateId,
        states: &[LalrStateDisk],
    ) -> Result<Self, TableError> {
        if initial as usize >= states.len() {
            return Err(out_of_range("initial LALR(1) state", initial as usize, states.len()));
        }
        let nt = nonterminals as usize;
        let mut actions = vec![None; states.len() * terminals];
        let mut gotos = vec![None; states.len() * nt];
        for (s, state) in states.iter().enumerate() {
            for &(term, action) in &state.actions {
                let col = terminal_column(nonterminals, terminals, term).ok_or_else(|| {
                    out_of_range("LALR(1) action symbol", term.index(), nt + terminals)
                })?;
                actions[s * terminals + col] = Some(action);
            }
            for &(sym, target) in &state.gotos {
                if sym.0 >= nonterminals {
                    return Err(out_of_range("LALR(1) goto symbol", sym.index(), nt));
                }
                gotos[s * nt + sym.index()] = Some(target);
            }
        }
        Ok(Self {
            initial,
            states: states.len(),
            nonterminals,
            width: terminals,
            actions,
            gotos,
        })
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.states
    }

    #[inline]
    pub fn action(&self, state: StateId, terminal: SymbolId) -> Option<Action> {
        let col = terminal_column(self.nonterminals, self.width, terminal)?;
        self.actions
            .get(state as usize * self.width + col)
            .copied()
            .flatten()
    }

    #[inline]
    pub fn goto(&self, state: StateId, nonterminal: SymbolId) -> Option<StateId> {
        if nonterminal.0 >= self.nonterminals {
            return None;
        }
        self.gotos
            .get(state as usize * self.nonterminals as usize + nonterminal.index())
            .copied()
            .flatten()
    }

    /// Terminals with an action in `state`.
    pub fn expected(&self, state: StateId) -> Vec<SymbolId> {
        let start = state as usize * self.width;
        match self.actions.get(start..start + self.width) {
            Some(row) => row
                .iter()
                .enumerate()
                .filter(|(_, a)| a.is_some())
                .map(|(col, _)| SymbolId(self.nonterminals + col as u16))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().filter_map(|a| *a)
    }

    pub fn goto_targets(&self) -> impl Iterator<Item = StateId> + '_ {
        self.gotos.iter().filter_map(|g| *g)
    }

    pub(crate) fn to_disk(&self) -> Vec<LalrStateDisk> {
        let nt = self.nonterminals as usize;
        (0..self.state_count())
            .map(|s| LalrStateDisk {
                actions: self.actions[s * self.width..][..self.width]
                    .iter()
                    .enumerate()
                    .filter_map(|(col, a)| a.map(|a| (SymbolId(self.nonterminals + col as u16), a)))
                    .collect(),
                gotos: self.gotos[s * nt..][..nt]
                    .iter()
                    .enumerate()
                    .filter_map(|(sym, g)| g.map(|g| (SymbolId(sym as u16), g)))
                    .collect(),
            })
            .collect()
    }
}
