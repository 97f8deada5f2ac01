// src/tables/mod.rs
pub mod compact;
pub mod dfa;
pub mod io;
pub mod parse;
pub mod script;

use std::{collections::BTreeMap, fmt};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub use compact::{encode_tables_bin, load_tables_bin_bytes, save_tables_bin};
pub use dfa::{BlockEnd, CharDfa, DfaEdge, DfaState};
pub use io::{load_tables_bytes, load_tables_file, load_tables_json_bytes, save_tables_json};
pub use parse::{Action, LalrTable, LlTable};
pub use script::script_tables;

use crate::error::TableError;

/// Index into [`GrammarTables::symbols`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u16);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into [`GrammarTables::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u16);

impl RuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// DFA or LALR(1) automaton state.
pub type StateId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    NonTerminal,
    Terminal,
    /// Whitespace, comments: lexed but kept out of the derivation.
    Hidden,
    EndOfStream,
    Error,
}

/// Per-symbol grammar metadata, stored flat and indexed by [`SymbolId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMetadata {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute: Option<SymbolId>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl SymbolMetadata {
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.kind == SymbolKind::Hidden
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: SymbolId,
    #[serde(default)]
    pub rhs: Vec<SymbolId>,
}

impl Rule {
    /// Left side plus right side, the way rule lengths are counted in the tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.rhs.len() + 1
    }

    #[inline]
    pub fn is_empty_production(&self) -> bool {
        self.rhs.is_empty()
    }
}

/// Everything one grammar needs at runtime. Immutable once loaded; engines
/// borrow it and never write to it, so one instance can back any number of
/// independent tokenizers and parsers, across threads.
#[derive(Debug, Clone)]
pub struct GrammarTables {
    pub name: String,
    pub version: u32,
    pub symbols: Vec<SymbolMetadata>,
    pub nonterminal_count: u16,
    pub start_symbol: SymbolId,
    pub end_of_stream: SymbolId,
    pub error: SymbolId,
    pub rules: Vec<Rule>,
    pub dfa: CharDfa,
    /// Dense, indexed by symbol id.
    pub block_ends: Vec<Option<BlockEnd>>,
    pub ll: Option<LlTable>,
    pub lalr: Option<LalrTable>,
    by_name: HashMap<String, SymbolId>,
}

/// Raw pieces handed over by the asset loaders; [`GrammarTables::from_parts`]
/// validates them.
pub(crate) struct TableParts {
    pub name: String,
    pub version: u32,
    pub symbols: Vec<SymbolMetadata>,
    pub start_symbol: SymbolId,
    pub end_of_stream: SymbolId,
    pub error: SymbolId,
    pub rules: Vec<Rule>,
    pub dfa: CharDfa,
    pub block_ends: Vec<BlockEnd>,
    pub ll: Option<Vec<(SymbolId, SymbolId, RuleId)>>,
    pub lalr: Option<(StateId, Vec<parse::LalrStateDisk>)>,
}

impl GrammarTables {
    pub(crate) fn from_parts(parts: TableParts) -> Result<Self, TableError> {
        let TableParts {
            name,
            version,
            symbols,
            start_symbol,
            end_of_stream,
            error,
            rules,
            dfa,
            block_ends,
            ll,
            lalr,
        } = parts;

        if symbols.len() > u16::MAX as usize {
            return Err(TableError::Overflow { what: "symbol count" });
        }
        let nonterminal_count = symbols
            .iter()
            .take_while(|s| s.kind == SymbolKind::NonTerminal)
            .count() as u16;

        let mut by_name = HashMap::with_capacity(symbols.len());
        for (i, s) in symbols.iter().enumerate() {
            if by_name.insert(s.name.clone(), SymbolId(i as u16)).is_some() {
                return Err(TableError::DuplicateName(s.name.clone()));
            }
        }

        let mut dense_block_ends = vec![None; symbols.len()];
        for b in block_ends {
            let slot = dense_block_ends
                .get_mut(b.symbol.index())
                .ok_or(TableError::OutOfRange {
                    what: "block-end symbol",
                    id: b.symbol.index(),
                    limit: symbols.len(),
                })?;
            *slot = Some(b);
        }

        let terminals = symbols.len() - nonterminal_count as usize;
        let ll = match ll {
            Some(entries) => Some(LlTable::from_entries(
                nonterminal_count,
                terminals,
                &entries,
            )?),
            None => None,
        };
        let lalr = match lalr {
            Some((initial, states)) => Some(LalrTable::from_states(
                nonterminal_count,
                terminals,
                initial,
                &states,
            )?),
            None => None,
        };

        let tables = Self {
            name,
            version,
            symbols,
            nonterminal_count,
            start_symbol,
            end_of_stream,
            error,
            rules,
            dfa,
            block_ends: dense_block_ends,
            ll,
            lalr,
            by_name,
        };
        tables.validate()?;
        log::debug!(
            "[tables] loaded grammar {:?} v{}: {} symbols ({} non-terminals), {} rules, {} DFA states",
            tables.name,
            tables.version,
            tables.symbols.len(),
            tables.nonterminal_count,
            tables.rules.len(),
            tables.dfa.states.len()
        );
        Ok(tables)
    }

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> Option<&SymbolMetadata> {
        self.symbols.get(id.index())
    }

    /// Display name, or `"?"` for ids outside the table.
    pub fn name(&self, id: SymbolId) -> &str {
        self.symbol(id).map(|s| s.name.as_str()).unwrap_or("?")
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    pub fn attribute(&self, id: SymbolId, key: &str) -> Option<&str> {
        self.symbol(id)
            .and_then(|s| s.attributes.get(key))
            .map(String::as_str)
    }

    #[inline]
    pub fn is_nonterminal(&self, id: SymbolId) -> bool {
        id.0 < self.nonterminal_count
    }

    #[inline]
    pub fn is_hidden(&self, id: SymbolId) -> bool {
        self.symbol(id).is_some_and(SymbolMetadata::is_hidden)
    }

    #[inline]
    pub fn terminal_count(&self) -> usize {
        self.symbols.len() - self.nonterminal_count as usize
    }

    #[inline]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    #[inline]
    pub fn block_end(&self, id: SymbolId) -> Option<&BlockEnd> {
        self.block_ends.get(id.index()).and_then(Option::as_ref)
    }

    pub fn ll(&self) -> Result<&LlTable, TableError> {
        self.ll
            .as_ref()
            .ok_or_else(|| TableError::MissingLlTable(self.name.clone()))
    }

    pub fn lalr(&self) -> Result<&LalrTable, TableError> {
        self.lalr
            .as_ref()
            .ok_or_else(|| TableError::MissingLalrTable(self.name.clone()))
    }

    /// Names for a list of symbols, for diagnostics.
    pub fn names(&self, ids: &[SymbolId]) -> Vec<&str> {
        ids.iter().map(|&id| self.name(id)).collect()
    }

    fn check_symbol(&self, what: &'static str, id: SymbolId) -> Result<&SymbolMetadata, TableError> {
        self.symbol(id).ok_or(TableError::OutOfRange {
            what,
            id: id.index(),
            limit: self.symbols.len(),
        })
    }

    fn expect_kind(&self, id: SymbolId, kind: SymbolKind, expected: &'static str) -> Result<(), TableError> {
        let s = self.check_symbol(expected, id)?;
        if s.kind != kind {
            return Err(TableError::WrongKind {
                name: s.name.clone(),
                id: id.0,
                expected,
            });
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), TableError> {
        for (i, s) in self.symbols.iter().enumerate().skip(self.nonterminal_count as usize) {
            if s.kind == SymbolKind::NonTerminal {
                return Err(TableError::Layout {
                    name: s.name.clone(),
                    id: i as u16,
                    count: self.nonterminal_count,
                });
            }
        }
        for s in &self.symbols {
            if let Some(sub) = s.substitute {
                self.check_symbol("substitute symbol", sub)?;
            }
        }

        self.expect_kind(self.start_symbol, SymbolKind::NonTerminal, "a non-terminal start symbol")?;
        self.expect_kind(self.end_of_stream, SymbolKind::EndOfStream, "the end-of-stream symbol")?;
        self.expect_kind(self.error, SymbolKind::Error, "the error symbol")?;

        for rule in &self.rules {
            if !self.is_nonterminal(rule.lhs) {
                let s = self.check_symbol("rule left side", rule.lhs)?;
                return Err(TableError::WrongKind {
                    name: s.name.clone(),
                    id: rule.lhs.0,
                    expected: "a non-terminal on a rule's left side",
                });
            }
            for &sym in &rule.rhs {
                self.check_symbol("rule right side", sym)?;
            }
        }

        let dfa_states = self.dfa.states.len();
        if self.dfa.initial as usize >= dfa_states {
            return Err(TableError::OutOfRange {
                what: "initial DFA state",
                id: self.dfa.initial as usize,
                limit: dfa_states,
            });
        }
        for state in &self.dfa.states {
            if let Some(acc) = state.accept {
                let s = self.check_symbol("DFA accept symbol", acc)?;
                if s.kind == SymbolKind::NonTerminal {
                    return Err(TableError::WrongKind {
                        name: s.name.clone(),
                        id: acc.0,
                        expected: "a terminal when accepted by the DFA",
                    });
                }
            }
            for edge in &state.edges {
                if edge.target as usize >= dfa_states {
                    return Err(TableError::OutOfRange {
                        what: "DFA edge target",
                        id: edge.target as usize,
                        limit: dfa_states,
                    });
                }
            }
        }

        for (i, b) in self.block_ends.iter().enumerate() {
            if let Some(b) = b {
                if b.terminator.is_empty() {
                    return Err(TableError::EmptyTerminator(self.symbols[i].name.clone()));
                }
            }
        }

        if let Some(ll) = &self.ll {
            for (row, _col, rule) in ll.entries() {
                let r = self.rule(rule).ok_or(TableError::OutOfRange {
                    what: "LL(1) rule",
                    id: rule.index(),
                    limit: self.rules.len(),
                })?;
                if r.lhs.index() != row {
                    return Err(TableError::RuleMismatch {
                        row: self.symbols[row].name.clone(),
                        rule: rule.0,
                        lhs: self.name(r.lhs).to_string(),
                    });
                }
            }
        }

        if let Some(lalr) = &self.lalr {
            let states = lalr.state_count();
            for action in lalr.actions() {
                match action {
                    Action::Shift(target) if target as usize >= states => {
                        return Err(TableError::OutOfRange {
                            what: "LALR(1) shift target",
                            id: target as usize,
                            limit: states,
                        });
                    }
                    Action::Reduce(rule) if rule.index() >= self.rules.len() => {
                        return Err(TableError::OutOfRange {
                            what: "LALR(1) reduce rule",
                            id: rule.index(),
                            limit: self.rules.len(),
                        });
                    }
                    _ => {}
                }
            }
            for target in lalr.goto_targets() {
                if target as usize >= states {
                    return Err(TableError::OutOfRange {
                        what: "LALR(1) goto target",
                        id: target as usize,
                        limit: states,
                    });
                }
            }
        }

        Ok(())
    }
}
