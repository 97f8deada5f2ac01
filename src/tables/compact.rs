// src/tables/compact.rs
// Compact binary form of a grammar asset:
//   magic: 8 bytes = "TBGRAM01"
//   u32:   version
//   str:   name                      (u32 byte length + UTF-8)
//   u16 x3 start_symbol, end_of_stream, error
//   u32:   n_symbols, then per symbol:
//            str name, u8 kind, u8 collapsed, u16 substitute (0xFFFF = none),
//            u16 n_attributes, (str key, str value) * n
//   u32:   n_rules, then per rule: u16 lhs, u16 n_rhs, u16 * n_rhs
//   u32:   dfa initial, u32 n_states, then per state:
//            u16 accept (0xFFFF = none), u16 n_edges, per edge:
//              u32 target, u16 n_ranges, (u32 lo, u32 hi) * n_ranges
//   u16:   n_block_ends, per entry: u16 symbol, str terminator, u32 escape (0xFFFF_FFFF = none)
//   u8:    has_ll, then u32 n_entries, (u16 row, u16 terminal, u16 rule) * n
//   u8:    has_lalr, then u32 initial, u32 n_states, per state:
//            u16 n_actions, (u16 terminal, u8 tag, u32 arg) * n
//            u16 n_gotos, (u16 non-terminal, u32 target) * n
// All integers little-endian.

use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use super::{
    Action, BlockEnd, CharDfa, DfaEdge, DfaState, GrammarTables, Rule, RuleId, SymbolId,
    SymbolKind, SymbolMetadata,
    io::{GrammarDisk, LalrDisk, LlDisk},
    parse::LalrStateDisk,
};
use crate::error::TableError;

pub const BIN_MAGIC: &[u8; 8] = b"TBGRAM01";
const NONE_U16: u16 = 0xFFFF;
const NONE_U32: u32 = 0xFFFF_FFFF;

const TAG_SHIFT: u8 = 0;
const TAG_REDUCE: u8 = 1;
const TAG_ACCEPT: u8 = 2;

// -------------------- writing --------------------

struct BinWriter {
    buf: Vec<u8>,
}

impl BinWriter {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }
    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }
    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }
    fn len16(&mut self, n: usize, what: &'static str) -> Result<(), TableError> {
        let v = u16::try_from(n).map_err(|_| TableError::Overflow { what })?;
        self.u16(v);
        Ok(())
    }
    fn len32(&mut self, n: usize, what: &'static str) -> Result<(), TableError> {
        let v = u32::try_from(n).map_err(|_| TableError::Overflow { what })?;
        self.u32(v);
        Ok(())
    }
    fn str(&mut self, s: &str) -> Result<(), TableError> {
        self.len32(s.len(), "string length")?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

fn kind_code(k: SymbolKind) -> u8 {
    match k {
        SymbolKind::NonTerminal => 0,
        SymbolKind::Terminal => 1,
        SymbolKind::Hidden => 2,
        SymbolKind::EndOfStream => 3,
        SymbolKind::Error => 4,
    }
}

pub fn encode_tables_bin(t: &GrammarTables) -> Result<Vec<u8>, TableError> {
    let d = GrammarDisk::from(t);
    let mut w = BinWriter { buf: Vec::new() };

    w.buf.extend_from_slice(BIN_MAGIC);
    w.u32(d.version);
    w.str(&d.name)?;
    w.u16(d.start_symbol.0);
    w.u16(d.end_of_stream.0);
    w.u16(d.error.0);

    w.len32(d.symbols.len(), "symbol count")?;
    for s in &d.symbols {
        w.str(&s.name)?;
        w.u8(kind_code(s.kind));
        w.u8(s.collapsed as u8);
        w.u16(s.substitute.map_or(NONE_U16, |id| id.0));
        w.len16(s.attributes.len(), "attribute count")?;
        for (k, v) in &s.attributes {
            w.str(k)?;
            w.str(v)?;
        }
    }

    w.len32(d.rules.len(), "rule count")?;
    for r in &d.rules {
        w.u16(r.lhs.0);
        w.len16(r.rhs.len(), "rule length")?;
        for s in &r.rhs {
            w.u16(s.0);
        }
    }

    w.u32(d.dfa.initial);
    w.len32(d.dfa.states.len(), "DFA state count")?;
    for st in &d.dfa.states {
        w.u16(st.accept.map_or(NONE_U16, |id| id.0));
        w.len16(st.edges.len(), "DFA edge count")?;
        for e in &st.edges {
            w.u32(e.target);
            w.len16(e.ranges.len(), "DFA range count")?;
            for &(lo, hi) in &e.ranges {
                w.u32(lo as u32);
                w.u32(hi as u32);
            }
        }
    }

    w.len16(d.block_ends.len(), "block-end count")?;
    for b in &d.block_ends {
        w.u16(b.symbol.0);
        w.str(&b.terminator)?;
        w.u32(b.escape.map_or(NONE_U32, |c| c as u32));
    }

    match &d.ll {
        Some(ll) => {
            w.u8(1);
            w.len32(ll.entries.len(), "LL(1) entry count")?;
            for &(row, term, rule) in &ll.entries {
                w.u16(row.0);
                w.u16(term.0);
                w.u16(rule.0);
            }
        }
        None => w.u8(0),
    }

    match &d.lalr {
        Some(lalr) => {
            w.u8(1);
            w.u32(lalr.initial);
            w.len32(lalr.states.len(), "LALR(1) state count")?;
            for st in &lalr.states {
                w.len16(st.actions.len(), "LALR(1) action count")?;
                for &(term, action) in &st.actions {
                    w.u16(term.0);
                    match action {
                        Action::Shift(s) => {
                            w.u8(TAG_SHIFT);
                            w.u32(s);
                        }
                        Action::Reduce(r) => {
                            w.u8(TAG_REDUCE);
                            w.u32(r.0 as u32);
                        }
                        Action::Accept => {
                            w.u8(TAG_ACCEPT);
                            w.u32(0);
                        }
                    }
                }
                w.len16(st.gotos.len(), "LALR(1) goto count")?;
                for &(nt, target) in &st.gotos {
                    w.u16(nt.0);
                    w.u32(target);
                }
            }
        }
        None => w.u8(0),
    }

    Ok(w.buf)
}

pub fn save_tables_bin(path: &Path, t: &GrammarTables) -> Result<(), TableError> {
    let instant = Instant::now();
    let bytes = encode_tables_bin(t)?;
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    w.write_all(&bytes)?;
    w.flush()?;
    log::info!(
        "[tables] saved {} bytes to {} in {} ms",
        bytes.len(),
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

// -------------------- reading --------------------

#[inline]
fn take<'a>(buf: &mut &'a [u8], n: usize, what: &'static str) -> Result<&'a [u8], TableError> {
    if buf.len() < n {
        return Err(TableError::Truncated(what));
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

#[inline]
fn take_u8(buf: &mut &[u8], what: &'static str) -> Result<u8, TableError> {
    Ok(take(buf, 1, what)?[0])
}

#[inline]
fn take_u16(buf: &mut &[u8], what: &'static str) -> Result<u16, TableError> {
    let mut le = [0u8; 2];
    le.copy_from_slice(take(buf, 2, what)?);
    Ok(u16::from_le_bytes(le))
}

#[inline]
fn take_u32(buf: &mut &[u8], what: &'static str) -> Result<u32, TableError> {
    let mut le = [0u8; 4];
    le.copy_from_slice(take(buf, 4, what)?);
    Ok(u32::from_le_bytes(le))
}

fn take_str(buf: &mut &[u8], what: &'static str) -> Result<String, TableError> {
    let n = take_u32(buf, what)? as usize;
    Ok(String::from_utf8(take(buf, n, what)?.to_vec())?)
}

fn take_char(buf: &mut &[u8], what: &'static str) -> Result<char, TableError> {
    let v = take_u32(buf, what)?;
    char::from_u32(v).ok_or(TableError::InvalidChar(v))
}

fn opt_symbol(v: u16) -> Option<SymbolId> {
    (v != NONE_U16).then_some(SymbolId(v))
}

fn kind_from_code(v: u8) -> Result<SymbolKind, TableError> {
    Ok(match v {
        0 => SymbolKind::NonTerminal,
        1 => SymbolKind::Terminal,
        2 => SymbolKind::Hidden,
        3 => SymbolKind::EndOfStream,
        4 => SymbolKind::Error,
        _ => {
            return Err(TableError::OutOfRange {
                what: "symbol kind code",
                id: v as usize,
                limit: 5,
            });
        }
    })
}

pub fn load_tables_bin_bytes(mut data: &[u8]) -> Result<GrammarTables, TableError> {
    let magic = take(&mut data, 8, "magic")?;
    if magic != BIN_MAGIC {
        return Err(TableError::BadMagic);
    }
    let buf = &mut data;

    let version = take_u32(buf, "version")?;
    let name = take_str(buf, "name")?;
    let start_symbol = SymbolId(take_u16(buf, "start symbol")?);
    let end_of_stream = SymbolId(take_u16(buf, "end-of-stream symbol")?);
    let error = SymbolId(take_u16(buf, "error symbol")?);

    let n_symbols = take_u32(buf, "symbol count")? as usize;
    let mut symbols = Vec::with_capacity(n_symbols.min(u16::MAX as usize));
    for _ in 0..n_symbols {
        let name = take_str(buf, "symbol name")?;
        let kind = kind_from_code(take_u8(buf, "symbol kind")?)?;
        let collapsed = take_u8(buf, "collapsed flag")? != 0;
        let substitute = opt_symbol(take_u16(buf, "substitute")?);
        let n_attr = take_u16(buf, "attribute count")?;
        let mut attributes = std::collections::BTreeMap::new();
        for _ in 0..n_attr {
            let k = take_str(buf, "attribute key")?;
            let v = take_str(buf, "attribute value")?;
            attributes.insert(k, v);
        }
        symbols.push(SymbolMetadata {
            name,
            kind,
            attributes,
            substitute,
            collapsed,
        });
    }

    let n_rules = take_u32(buf, "rule count")? as usize;
    let mut rules = Vec::with_capacity(n_rules.min(u16::MAX as usize));
    for _ in 0..n_rules {
        let lhs = SymbolId(take_u16(buf, "rule lhs")?);
        let n = take_u16(buf, "rule length")?;
        let mut rhs = Vec::with_capacity(n as usize);
        for _ in 0..n {
            rhs.push(SymbolId(take_u16(buf, "rule rhs")?));
        }
        rules.push(Rule { lhs, rhs });
    }

    let initial = take_u32(buf, "DFA initial state")?;
    let n_states = take_u32(buf, "DFA state count")? as usize;
    let mut states = Vec::with_capacity(n_states.min(1 << 16));
    for _ in 0..n_states {
        let accept = opt_symbol(take_u16(buf, "DFA accept")?);
        let n_edges = take_u16(buf, "DFA edge count")?;
        let mut edges = Vec::with_capacity(n_edges as usize);
        for _ in 0..n_edges {
            let target = take_u32(buf, "DFA edge target")?;
            let n_ranges = take_u16(buf, "DFA range count")?;
            let mut ranges = Vec::with_capacity(n_ranges as usize);
            for _ in 0..n_ranges {
                let lo = take_char(buf, "DFA range")?;
                let hi = take_char(buf, "DFA range")?;
                ranges.push((lo, hi));
            }
            edges.push(DfaEdge { ranges, target });
        }
        states.push(DfaState { accept, edges });
    }

    let n_blocks = take_u16(buf, "block-end count")?;
    let mut block_ends = Vec::with_capacity(n_blocks as usize);
    for _ in 0..n_blocks {
        let symbol = SymbolId(take_u16(buf, "block-end symbol")?);
        let terminator = take_str(buf, "block-end terminator")?;
        let esc = take_u32(buf, "block-end escape")?;
        let escape = if esc == NONE_U32 {
            None
        } else {
            Some(char::from_u32(esc).ok_or(TableError::InvalidChar(esc))?)
        };
        block_ends.push(BlockEnd {
            symbol,
            terminator,
            escape,
        });
    }

    let ll = if take_u8(buf, "LL(1) flag")? != 0 {
        let n = take_u32(buf, "LL(1) entry count")? as usize;
        let mut entries = Vec::with_capacity(n.min(1 << 20));
        for _ in 0..n {
            let row = SymbolId(take_u16(buf, "LL(1) row")?);
            let term = SymbolId(take_u16(buf, "LL(1) terminal")?);
            let rule = RuleId(take_u16(buf, "LL(1) rule")?);
            entries.push((row, term, rule));
        }
        Some(LlDisk { entries })
    } else {
        None
    };

    let lalr = if take_u8(buf, "LALR(1) flag")? != 0 {
        let initial = take_u32(buf, "LALR(1) initial state")?;
        let n = take_u32(buf, "LALR(1) state count")? as usize;
        let mut states = Vec::with_capacity(n.min(1 << 16));
        for _ in 0..n {
            let n_actions = take_u16(buf, "LALR(1) action count")?;
            let mut actions = Vec::with_capacity(n_actions as usize);
            for _ in 0..n_actions {
                let term = SymbolId(take_u16(buf, "LALR(1) action symbol")?);
                let tag = take_u8(buf, "LALR(1) action tag")?;
                let arg = take_u32(buf, "LALR(1) action argument")?;
                let action = match tag {
                    TAG_SHIFT => Action::Shift(arg),
                    TAG_REDUCE => Action::Reduce(RuleId(
                        u16::try_from(arg).map_err(|_| TableError::Overflow { what: "rule id" })?,
                    )),
                    TAG_ACCEPT => Action::Accept,
                    _ => {
                        return Err(TableError::OutOfRange {
                            what: "LALR(1) action tag",
                            id: tag as usize,
                            limit: 3,
                        });
                    }
                };
                actions.push((term, action));
            }
            let n_gotos = take_u16(buf, "LALR(1) goto count")?;
            let mut gotos = Vec::with_capacity(n_gotos as usize);
            for _ in 0..n_gotos {
                let nt = SymbolId(take_u16(buf, "LALR(1) goto symbol")?);
                let target = take_u32(buf, "LALR(1) goto target")?;
                gotos.push((nt, target));
            }
            states.push(LalrStateDisk { actions, gotos });
        }
        Some(LalrDisk { initial, states })
    } else {
        None
    };

    GrammarDisk {
        format: super::io::FORMAT_NAME.to_string(),
        version,
        name,
        start_symbol,
        end_of_stream,
        error,
        symbols,
        rules,
        dfa: CharDfa { initial, states },
        block_ends,
        ll,
        lalr,
    }
    .into_tables()
}
