// src/tables/io.rs
use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{
    BlockEnd, CharDfa, GrammarTables, Rule, RuleId, StateId, SymbolId, SymbolMetadata,
    TableParts, compact, parse::LalrStateDisk,
};
use crate::error::TableError;

pub const FORMAT_NAME: &str = "tabula-grammar";
pub const FORMAT_VERSION: u32 = 1;

// -------------------- disk model --------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlDisk {
    /// `(non-terminal, terminal, rule)`
    pub entries: Vec<(SymbolId, SymbolId, RuleId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LalrDisk {
    #[serde(default)]
    pub initial: StateId,
    pub states: Vec<LalrStateDisk>,
}

/// Serialized grammar asset. Shared by the JSON and compact binary codecs;
/// both funnel through [`GrammarDisk::into_tables`] so every load is validated.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDisk {
    pub format: String,
    pub version: u32,
    pub name: String,
    pub start_symbol: SymbolId,
    pub end_of_stream: SymbolId,
    pub error: SymbolId,
    pub symbols: Vec<SymbolMetadata>,
    pub rules: Vec<Rule>,
    pub dfa: CharDfa,
    #[serde(default)]
    pub block_ends: Vec<BlockEnd>,
    pub ll: Option<LlDisk>,
    pub lalr: Option<LalrDisk>,
}

impl From<&GrammarTables> for GrammarDisk {
    fn from(t: &GrammarTables) -> Self {
        Self {
            format: FORMAT_NAME.to_string(),
            version: t.version,
            name: t.name.clone(),
            start_symbol: t.start_symbol,
            end_of_stream: t.end_of_stream,
            error: t.error,
            symbols: t.symbols.clone(),
            rules: t.rules.clone(),
            dfa: t.dfa.clone(),
            block_ends: t.block_ends.iter().flatten().cloned().collect(),
            ll: t.ll.as_ref().map(|ll| LlDisk {
                entries: ll.to_disk(),
            }),
            lalr: t.lalr.as_ref().map(|lalr| LalrDisk {
                initial: lalr.initial,
                states: lalr.to_disk(),
            }),
        }
    }
}

impl GrammarDisk {
    pub fn into_tables(self) -> Result<GrammarTables, TableError> {
        if self.format != FORMAT_NAME {
            return Err(TableError::UnknownFormat(self.format));
        }
        if self.version != FORMAT_VERSION {
            return Err(TableError::UnsupportedVersion {
                found: self.version,
                supported: FORMAT_VERSION,
            });
        }
        GrammarTables::from_parts(TableParts {
            name: self.name,
            version: self.version,
            symbols: self.symbols,
            start_symbol: self.start_symbol,
            end_of_stream: self.end_of_stream,
            error: self.error,
            rules: self.rules,
            dfa: self.dfa,
            block_ends: self.block_ends,
            ll: self.ll.map(|ll| ll.entries),
            lalr: self.lalr.map(|lalr| (lalr.initial, lalr.states)),
        })
    }
}

// -------------------- JSON (de)serialization --------------------

pub fn save_tables_json(path: &Path, t: &GrammarTables) -> Result<(), TableError> {
    let instant = Instant::now();
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &GrammarDisk::from(t))?;
    w.flush()?;
    log::info!(
        "[tables] saved {} to {} in {} ms",
        t.name,
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

pub fn load_tables_json_bytes(data: &[u8]) -> Result<GrammarTables, TableError> {
    serde_json::from_slice::<GrammarDisk>(data)?.into_tables()
}

// -------------------- any format --------------------

/// Loads either format, picking the codec by the compact magic.
pub fn load_tables_bytes(data: &[u8]) -> Result<GrammarTables, TableError> {
    if data.starts_with(compact::BIN_MAGIC) {
        compact::load_tables_bin_bytes(data)
    } else {
        load_tables_json_bytes(data)
    }
}

pub fn load_tables_file(path: &Path) -> Result<GrammarTables, TableError> {
    let data = std::fs::read(path)?;
    log::debug!("[tables] reading {} ({} bytes)", path.display(), data.len());
    load_tables_bytes(&data)
}
