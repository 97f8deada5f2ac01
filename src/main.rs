// src/main.rs
// Tokenize and parse a sample (or the file given as the first argument) with
// the grammar from TABULA_TABLES or the built-in script grammar.

use std::{env, fs, time::Instant};

use anyhow::{Context, Result};
use tabula::{
    Literal, ParseOptions, Strategy, parse_str, tables_from_env, tokenize,
};

const SAMPLE: &str = r#"
# sample settings
name = "Iron Province"
start_date = 1444.11.11
speed = -3
ratio >= 1.5
tags = { "x" "y" }
nested = { depth = { level = 2 } }
"#;

fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let (src, label) = match env::args().nth(1) {
        Some(path) => (
            fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
            path,
        ),
        None => (SAMPLE.to_string(), "sample".to_string()),
    };

    let tables = tables_from_env().context("loading grammar tables")?;
    let options = ParseOptions::from_env();
    let strategy = Strategy::from_env();

    println!("TOKENS ({label}):");
    for tok in tokenize(tables, &src).filter(|t| !tables.is_hidden(t.symbol)) {
        println!(
            "  {:>4}:{:<3} {:<10} {:?}",
            tok.line,
            tok.column,
            tables.name(tok.symbol),
            tok.text
        );
    }

    let t0 = Instant::now();
    let tree = parse_str(tables, &src, strategy, &options)?;
    let ms = t0.elapsed().as_secs_f64() * 1e3;
    eprintln!("[tabula] {} parse {:.3} ms", strategy.label(), ms);

    let Some(tree) = tree else {
        println!("(empty document)");
        return Ok(());
    };
    println!("TREE:");
    print!("{tree}");

    let literals: Vec<String> = tree
        .leaves()
        .into_iter()
        .filter_map(|n| Literal::from_node(tables, n))
        .map(|l| l.to_string())
        .collect();
    println!("LITERALS: {}", literals.join(" "));

    for err in tree.errors() {
        eprintln!(
            "[tabula] syntax error at {}:{}: {:?}",
            err.line,
            err.column,
            err.value.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
