// src/lib.rs
// Table-driven lexer and parser engine. Grammars arrive as precompiled table
// assets; two strategies (LL(1) and LALR(1)) share one tokenizer and one
// tree builder.

pub mod api;
pub mod dev;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod tables;
pub mod tree;

pub use api::{ParseOptions, Strategy, engine, env_flag_true, parse, parse_batch, parse_str};
pub use error::TableError;
pub use lexer::{Position, Token, Tokenizer, tokenize};
pub use parser::{NodeType, ParseEngine, ParseEvent, PredictiveParser, ShiftReduceParser, SyntaxError};
pub use tables::{GrammarTables, RuleId, SymbolId, script_tables};
pub use tree::{Literal, ParseNode, TreeBuilder};

/// Tables named by `TABULA_TABLES` (JSON or compact binary), else the
/// built-in script grammar. Loaded once per process.
pub fn tables_from_env() -> Result<&'static GrammarTables, TableError> {
    static OVERRIDE: std::sync::OnceLock<GrammarTables> = std::sync::OnceLock::new();
    match std::env::var("TABULA_TABLES") {
        Ok(path) if !path.is_empty() => {
            if let Some(t) = OVERRIDE.get() {
                return Ok(t);
            }
            let loaded = tables::load_tables_file(std::path::Path::new(&path))?;
            Ok(OVERRIDE.get_or_init(|| loaded))
        }
        _ => script_tables(),
    }
}
