// src/api.rs
// One-shot entry points: pick an engine, drive it through the tree builder.

use rayon::prelude::*;

use crate::{
    error::TableError,
    parser::{ParseEngine, PredictiveParser, ShiftReduceParser},
    tables::GrammarTables,
    tree::{ParseNode, TreeBuilder},
};

/// `"0"` and `"false"` switch a flag off, any other value switches it on.
pub fn env_flag_true(var: &str, default: bool) -> bool {
    std::env::var(var)
        .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub trim: bool,
    pub transform: bool,
    /// Keep whitespace and comments in the tree.
    pub show_hidden: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            trim: true,
            transform: true,
            show_hidden: false,
        }
    }
}

impl ParseOptions {
    /// Defaults overridden by `TABULA_TRIM`, `TABULA_TRANSFORM` and
    /// `TABULA_SHOW_HIDDEN`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            trim: env_flag_true("TABULA_TRIM", d.trim),
            transform: env_flag_true("TABULA_TRANSFORM", d.transform),
            show_hidden: env_flag_true("TABULA_SHOW_HIDDEN", d.show_hidden),
        }
    }

    pub fn builder(&self) -> TreeBuilder {
        TreeBuilder::new(self.trim, self.transform)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// LL(1)
    Predictive,
    /// LALR(1)
    #[default]
    ShiftReduce,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Predictive, Strategy::ShiftReduce];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ll" | "ll1" | "predictive" => Some(Strategy::Predictive),
            "lalr" | "lalr1" | "shift-reduce" | "shift_reduce" => Some(Strategy::ShiftReduce),
            _ => None,
        }
    }

    /// `TABULA_STRATEGY`, falling back to the default on absent or unknown values.
    pub fn from_env() -> Self {
        match std::env::var("TABULA_STRATEGY") {
            Ok(v) => Self::from_name(&v).unwrap_or_else(|| {
                log::warn!("[config] unknown TABULA_STRATEGY {v:?}, using default");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Predictive => "ll",
            Strategy::ShiftReduce => "lalr",
        }
    }
}

/// Engine of either strategy, boxed behind the common trait.
pub fn engine<'g, 'src>(
    tables: &'g GrammarTables,
    input: &'src str,
    strategy: Strategy,
    show_hidden: bool,
) -> Result<Box<dyn ParseEngine<'src> + 'g>, TableError>
where
    'src: 'g,
{
    Ok(match strategy {
        Strategy::Predictive => {
            Box::new(PredictiveParser::new(tables, input)?.with_hidden(show_hidden))
        }
        Strategy::ShiftReduce => {
            Box::new(ShiftReduceParser::new(tables, input)?.with_hidden(show_hidden))
        }
    })
}

/// Runs `engine` to completion. Hidden-token visibility is the engine's own
/// setting; `options` supplies trim and transform.
pub fn parse<'src, E>(engine: &mut E, options: &ParseOptions) -> Option<ParseNode>
where
    E: ParseEngine<'src> + ?Sized,
{
    options.builder().build(engine)
}

/// Parses `input` with a fresh engine. Only a grammar without the table the
/// strategy needs is an `Err`; malformed input yields error nodes.
pub fn parse_str(
    tables: &GrammarTables,
    input: &str,
    strategy: Strategy,
    options: &ParseOptions,
) -> Result<Option<ParseNode>, TableError> {
    let mut engine = engine(tables, input, strategy, options.show_hidden)?;
    Ok(parse(engine.as_mut(), options))
}

/// Parses every input on the rayon pool, one engine per input. Results keep
/// the order of `inputs`.
pub fn parse_batch<S>(
    tables: &GrammarTables,
    inputs: &[S],
    strategy: Strategy,
    options: &ParseOptions,
) -> Result<Vec<Option<ParseNode>>, TableError>
where
    S: AsRef<str> + Sync,
{
    // Fail before spawning if the table is missing.
    match strategy {
        Strategy::Predictive => tables.ll().map(|_| ())?,
        Strategy::ShiftReduce => tables.lalr().map(|_| ())?,
    }
    inputs
        .par_iter()
        .map(|src| parse_str(tables, src.as_ref(), strategy, options))
        .collect()
}
