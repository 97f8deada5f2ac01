// src/tables/script.rs
// Built-in grammar for the configuration script language, shipped as a JSON
// asset and loaded on first use.

use std::sync::OnceLock;

use super::{GrammarTables, io::load_tables_json_bytes};
use crate::error::TableError;

pub const SCRIPT_GRAMMAR_JSON: &str = include_str!("../../grammars/script.json");

static SCRIPT: OnceLock<GrammarTables> = OnceLock::new();

/// Process-wide script grammar tables.
pub fn script_tables() -> Result<&'static GrammarTables, TableError> {
    if let Some(t) = SCRIPT.get() {
        return Ok(t);
    }
    let loaded = load_tables_json_bytes(SCRIPT_GRAMMAR_JSON.as_bytes())?;
    Ok(SCRIPT.get_or_init(|| loaded))
}

/// Symbol ids of the built-in grammar, for tests and tools that match on them.
pub mod sym {
    use crate::tables::SymbolId;

    pub const CONFIG: SymbolId = SymbolId(0);
    pub const STATEMENTS: SymbolId = SymbolId(1);
    pub const STATEMENT: SymbolId = SymbolId(2);
    pub const STATEMENT_TAIL: SymbolId = SymbolId(3);
    pub const VALUE: SymbolId = SymbolId(4);
    pub const SCALAR: SymbolId = SymbolId(5);
    pub const BLOCK: SymbolId = SymbolId(6);
    pub const EOF: SymbolId = SymbolId(7);
    pub const ERROR: SymbolId = SymbolId(8);
    pub const WHITESPACE: SymbolId = SymbolId(9);
    pub const COMMENT: SymbolId = SymbolId(10);
    pub const LBRACE: SymbolId = SymbolId(11);
    pub const RBRACE: SymbolId = SymbolId(12);
    pub const SPECIFIER: SymbolId = SymbolId(13);
    pub const SYMBOL: SymbolId = SymbolId(14);
    pub const STRING: SymbolId = SymbolId(15);
    pub const INTEGER: SymbolId = SymbolId(16);
    pub const REAL: SymbolId = SymbolId(17);
    pub const DATE: SymbolId = SymbolId(18);
}
