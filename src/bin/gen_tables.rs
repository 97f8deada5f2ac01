// src/bin/gen_tables.rs
// Convert a JSON grammar asset to the compact binary form and print stats.
// Usage:
//   cargo run --bin gen_tables                       # built-in grammar -> tables/script.bin
//   cargo run --bin gen_tables -- in.json out.bin
//   GEN_TABLES_JSON=out.json cargo run --bin gen_tables   # also re-emit pretty JSON

use std::{env, fs, path::Path};

use anyhow::{Context, Result, bail};
use tabula::tables::{
    GrammarTables, encode_tables_bin, load_tables_bin_bytes, load_tables_file, save_tables_bin,
    save_tables_json, script_tables,
};

fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let mut args = env::args().skip(1);
    let input = args.next();
    let out = args.next().unwrap_or_else(|| "tables/script.bin".to_string());
    let out_path = Path::new(&out);

    let owned;
    let tables: &GrammarTables = match &input {
        Some(path) => {
            owned = load_tables_file(Path::new(path)).with_context(|| format!("loading {path}"))?;
            &owned
        }
        None => script_tables().context("loading built-in grammar")?,
    };
    println!(
        "[gen_tables] grammar {:?} from {}",
        tables.name,
        input.as_deref().unwrap_or("<built-in>")
    );
    print_stats(tables);

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    save_tables_bin(out_path, tables).with_context(|| format!("writing {}", out_path.display()))?;

    // Read it back: the binary must decode to the same tables.
    let bytes = fs::read(out_path)?;
    let back = load_tables_bin_bytes(&bytes).context("re-reading compact tables")?;
    if encode_tables_bin(&back)? != bytes {
        bail!("compact tables did not survive a round trip");
    }
    println!("[gen_tables] wrote {} ({} bytes)", out_path.display(), bytes.len());

    if let Ok(json_out) = env::var("GEN_TABLES_JSON") {
        save_tables_json(Path::new(&json_out), tables)
            .with_context(|| format!("writing {json_out}"))?;
        println!("[gen_tables] wrote {json_out}");
    }
    Ok(())
}

fn print_stats(t: &GrammarTables) {
    let edges: usize = t.dfa.states.iter().map(|s| s.edges.len()).sum();
    let ranges: usize = t
        .dfa
        .states
        .iter()
        .flat_map(|s| &s.edges)
        .map(|e| e.ranges.len())
        .sum();
    println!(
        "[gen_tables] symbols = {} ({} non-terminals, {} terminals), rules = {}",
        t.symbols.len(),
        t.nonterminal_count,
        t.terminal_count(),
        t.rules.len()
    );
    println!(
        "[gen_tables] DFA: {} states, {} edges, {} ranges, {} block ends",
        t.dfa.states.len(),
        edges,
        ranges,
        t.block_ends.iter().flatten().count()
    );
    match &t.ll {
        Some(ll) => println!("[gen_tables] LL(1): {} entries", ll.entries().count()),
        None => println!("[gen_tables] LL(1): none"),
    }
    match &t.lalr {
        Some(lalr) => println!(
            "[gen_tables] LALR(1): {} states, {} actions, {} gotos",
            lalr.state_count(),
            lalr.actions().count(),
            lalr.goto_targets().count()
        ),
        None => println!("[gen_tables] LALR(1): none"),
    }
}
