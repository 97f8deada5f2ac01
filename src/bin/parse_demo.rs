// src/bin/parse_demo.rs
// Parse one input with both engines, compare, and dump the tree as JSON.
// Usage:
//   cargo run --bin parse_demo -- file.cfg
//   PARSE_DEMO_LEN=5000 PARSE_DEMO_SEED=7 cargo run --bin parse_demo
//   PARSE_DEMO_OUT=tree.json  write the JSON tree there instead of stdout

use std::{env, fs, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use rand::{SeedableRng, rngs::StdRng};
use tabula::{
    ParseOptions, PredictiveParser, ShiftReduceParser, dev::generator::gen_valid_source, parse,
    tables_from_env,
};

fn load_or_generate() -> Result<(String, String)> {
    if let Some(path) = env::args().nth(1) {
        let p = PathBuf::from(&path);
        let t0 = Instant::now();
        let src = fs::read_to_string(&p).with_context(|| format!("reading {}", p.display()))?;
        let ms = t0.elapsed().as_secs_f64() * 1e3;
        println!(
            "Input: {} ({} bytes) | load {:.3} ms",
            p.display(),
            src.len(),
            ms
        );
        return Ok((src, format!("file:{}", p.display())));
    }

    let target_len = env::var("PARSE_DEMO_LEN")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000usize);
    let seed = env::var("PARSE_DEMO_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42u64);
    let mut rng = StdRng::seed_from_u64(seed);
    let t0 = Instant::now();
    let s = gen_valid_source(&mut rng, target_len);
    let ms = t0.elapsed().as_secs_f64() * 1e3;

    let out_dir = PathBuf::from("fuzz-cases");
    let _ = fs::create_dir_all(&out_dir);
    let out_path = out_dir.join(format!("parse_demo_seed{}_len{}.cfg", seed, s.len()));
    match fs::write(&out_path, &s) {
        Ok(()) => println!("[parse_demo] saved {}", out_path.display()),
        Err(e) => eprintln!(
            "[parse_demo] warning: failed to write {}: {e}",
            out_path.display()
        ),
    }
    println!(
        "Input: generated (len={} bytes) | gen {:.3} ms [seed={}]",
        s.len(),
        ms,
        seed
    );
    Ok((s, "generated".into()))
}

fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let (text, desc) = load_or_generate()?;
    let tables = tables_from_env().context("loading grammar tables")?;
    let options = ParseOptions::from_env();

    let t0 = Instant::now();
    let mut ll = PredictiveParser::new(tables, &text)?.with_hidden(options.show_hidden);
    let ll_tree = parse(&mut ll, &options);
    let ll_ms = t0.elapsed().as_secs_f64() * 1e3;

    let t1 = Instant::now();
    let mut lalr = ShiftReduceParser::new(tables, &text)?.with_hidden(options.show_hidden);
    let lalr_tree = parse(&mut lalr, &options);
    let lalr_ms = t1.elapsed().as_secs_f64() * 1e3;

    let nodes = |t: &Option<tabula::ParseNode>| t.as_ref().map_or(0, |t| t.node_count());
    let errors = |t: &Option<tabula::ParseNode>| t.as_ref().map_or(0, |t| t.errors().len());
    println!(
        "LL(1):   {:.3} ms | nodes = {} | errors = {}",
        ll_ms,
        nodes(&ll_tree),
        errors(&ll_tree)
    );
    println!(
        "LALR(1): {:.3} ms | nodes = {} | errors = {}",
        lalr_ms,
        nodes(&lalr_tree),
        errors(&lalr_tree)
    );

    let same = ll_tree == lalr_tree;
    println!(
        "[parse_demo] {desc}: trees {}",
        if same { "match ✅" } else { "differ ❌" }
    );

    let json = serde_json::to_string_pretty(&lalr_tree)?;
    match env::var("PARSE_DEMO_OUT") {
        Ok(out) => {
            fs::write(&out, json).with_context(|| format!("writing {out}"))?;
            println!("[parse_demo] wrote {out}");
        }
        Err(_) => println!("{json}"),
    }
    if !same {
        std::process::exit(1);
    }
    Ok(())
}
