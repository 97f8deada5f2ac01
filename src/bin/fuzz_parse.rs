// src/bin/fuzz_parse.rs
// Generate random script sources, run both engines, check them against each other.
//   - FUZZ_LEN, FUZZ_ITERS, FUZZ_SEED   size, count and seed of generated cases
//   - FUZZ_NOISY=1            damage the sources (skips the LL/LALR tree comparison)
//   - FUZZ_SAVE=1 and FUZZ_DIR=... save generated fuzz cases
//   - FUZZ_INPUT=path         replay a saved case
//   - FUZZ_EX=<files>         comma/colon-separated list of handcrafted .cfg files
//   - FUZZ_EX_DIR=<dir>       directory of .cfg files (default: "parser_tests")
//
// Sidecar golden files: <case>.tokens.json with {"tokens":[{"kind":"...", "text":"..."}...]}
// are checked against the tokenizer's non-hidden output.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use rand::{SeedableRng, rngs::StdRng};
use tabula::{
    GrammarTables, ParseNode, ParseOptions, Strategy,
    dev::generator::{gen_noisy_source, gen_valid_source},
    parse_str, tables_from_env, tokenize,
};

// ------------------ goldens ------------------

#[derive(serde::Deserialize)]
struct Golden {
    tokens: Vec<GoldenTok>,
}
#[derive(serde::Deserialize)]
struct GoldenTok {
    kind: String,
    text: String,
}

fn load_golden_for(base: &Path) -> Option<Golden> {
    let candidates = [
        base.with_extension("tokens.json"),
        base.with_extension("golden.json"),
    ];
    for p in candidates {
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            match serde_json::from_str::<Golden>(&s) {
                Ok(g) => return Some(g),
                Err(e) => {
                    eprintln!("[golden] failed to parse {}: {e}", p.display());
                    return None;
                }
            }
        }
    }
    None
}

fn check_against_golden(tables: &GrammarTables, src: &str, golden: &Golden) -> bool {
    let got: Vec<(&str, &str)> = tokenize(tables, src)
        .filter(|t| !tables.is_hidden(t.symbol) && t.symbol != tables.end_of_stream)
        .map(|t| (tables.name(t.symbol), t.text))
        .collect();
    if got.len() != golden.tokens.len() {
        eprintln!(
            "[golden] count mismatch: got={} expected={}",
            got.len(),
            golden.tokens.len()
        );
        return false;
    }
    for (i, ((kind, text), exp)) in got.iter().zip(&golden.tokens).enumerate() {
        if *kind != exp.kind || *text != exp.text {
            eprintln!(
                "[golden] mismatch at {}:\n  got:  kind={} text={:?}\n  want: kind={} text={:?}",
                i, kind, text, exp.kind, exp.text
            );
            return false;
        }
    }
    true
}

// ------------------ main ------------------

fn main() {
    let _ = env_logger::builder().try_init();
    let tables = match tables_from_env() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to load grammar tables: {e}");
            std::process::exit(1);
        }
    };

    // --- REPLAY A SINGLE CASE ---
    if let Ok(path) = std::env::var("FUZZ_INPUT") {
        eprintln!("[replay] reading {}", path);
        let s = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: failed to read {path}: {e}");
                std::process::exit(1);
            }
        };
        let ok = run_once(tables, &s, !noisy(), None);
        std::process::exit(if ok { 0 } else { 1 });
    }

    // --- HANDCRAFTED EXAMPLES (run before fuzzing) ---
    let examples = collect_examples();
    if !examples.is_empty() {
        eprintln!("[ex] running {} handcrafted example(s)…", examples.len());
        for (j, p) in examples.iter().enumerate() {
            match fs::read_to_string(p) {
                Ok(s) => {
                    eprintln!("[ex {j}] {}", p.display());
                    if !run_once(tables, &s, false, Some(p.as_path())) {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("[ex {j}] failed to read {}: {e}", p.display());
                    std::process::exit(1);
                }
            }
        }
    }

    // --- FUZZ MODE ---
    let save_cases = std::env::var("FUZZ_SAVE").ok().as_deref() == Some("1");
    let out_dir = std::env::var("FUZZ_DIR").unwrap_or_else(|_| "fuzz-cases".to_string());
    let len: usize = env_parse("FUZZ_LEN", 100_000);
    let iters: usize = env_parse("FUZZ_ITERS", 3);
    let seed: u64 = env_parse("FUZZ_SEED", 42);
    let noisy = noisy();

    eprintln!("[fuzz] len={len} iters={iters} seed={seed} noisy={noisy}");
    let mut rng = StdRng::seed_from_u64(seed);

    if save_cases {
        if let Err(e) = fs::create_dir_all(&out_dir) {
            eprintln!("error: failed to create {}: {e}", out_dir);
            std::process::exit(1);
        }
    }

    for i in 0..iters {
        let s = if noisy {
            gen_noisy_source(&mut rng, len)
        } else {
            gen_valid_source(&mut rng, len)
        };
        eprintln!("[fuzz] iter {i}: generated {} bytes", s.len());

        if save_cases {
            match save_case(&out_dir, seed, i, &s) {
                Ok(path) => eprintln!("[save] wrote {}", path.display()),
                Err(e) => eprintln!("[save] failed: {e}"),
            }
        }

        if !run_once(tables, &s, !noisy, None) {
            std::process::exit(1);
        }
    }
    eprintln!("[fuzz] all iterations passed ✅");
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn noisy() -> bool {
    std::env::var("FUZZ_NOISY").ok().as_deref() == Some("1")
}

// ---------- run one (LL vs LALR [+ optional golden]) ----------

fn run_once(
    tables: &GrammarTables,
    src: &str,
    expect_valid: bool,
    golden_for: Option<&Path>,
) -> bool {
    let mut ok = true;

    // Token spans must tile the input.
    let t0 = Instant::now();
    let mut rebuilt = String::with_capacity(src.len());
    let mut n_tokens = 0usize;
    let mut n_errors = 0usize;
    for tok in tokenize(tables, src) {
        rebuilt.push_str(tok.text);
        n_tokens += 1;
        n_errors += (tok.symbol == tables.error) as usize;
    }
    let lex_ms = t0.elapsed().as_secs_f64() * 1e3;
    if rebuilt != src {
        let i = first_difference(&rebuilt, src);
        eprintln!("[coverage] token texts diverge from input at byte {i}");
        dump_src_window(src, i);
        ok = false;
    }

    let plain = ParseOptions::default();
    let visible = ParseOptions {
        show_hidden: true,
        ..plain
    };
    let mut trees: Vec<Option<ParseNode>> = Vec::new();
    for strategy in Strategy::ALL {
        let t1 = Instant::now();
        let tree = match parse_str(tables, src, strategy, &plain) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("[{}] {e}", strategy.label());
                return false;
            }
        };
        let parse_ms = t1.elapsed().as_secs_f64() * 1e3;
        let errors = tree.as_ref().map_or(0, |t| t.errors().len());
        eprintln!(
            "[{}] lex {:.3} ms | parse {:.3} ms | tokens = {} (lex errors {}) | syntax errors = {}",
            strategy.label(),
            lex_ms,
            parse_ms,
            n_tokens,
            n_errors,
            errors
        );
        if expect_valid && errors > 0 {
            if let Some(first) = tree.as_ref().and_then(|t| t.errors().first().copied()) {
                eprintln!(
                    "[{}] unexpected error at {}:{}",
                    strategy.label(),
                    first.line,
                    first.column
                );
                dump_src_window(src, first.offset);
            }
            ok = false;
        }

        // With hidden tokens in the tree, the leaves give back the input.
        match parse_str(tables, src, strategy, &visible) {
            Ok(full) => {
                let text = full.map(|t| t.source_text()).unwrap_or_default();
                if text != src {
                    let i = first_difference(&text, src);
                    eprintln!(
                        "[{}] reconstruction diverges at byte {i}",
                        strategy.label()
                    );
                    dump_src_window(src, i);
                    ok = false;
                }
            }
            Err(e) => {
                eprintln!("[{}] {e}", strategy.label());
                return false;
            }
        }
        trees.push(tree);
    }

    if expect_valid && trees[0] != trees[1] {
        eprintln!("[diff] LL(1) and LALR(1) trees differ");
        dump_first_leaf_diff(&trees[0], &trees[1]);
        ok = false;
    }

    if let Some(p) = golden_for {
        match load_golden_for(p) {
            Some(g) => ok &= check_against_golden(tables, src, &g),
            None => eprintln!("[golden] no sidecar found for {}", p.display()),
        }
    }
    ok
}

// ---------- handcrafted examples discovery ----------

fn collect_examples() -> Vec<PathBuf> {
    // FUZZ_EX takes precedence; split on ',' or ':'
    if let Ok(list) = std::env::var("FUZZ_EX") {
        let out: Vec<PathBuf> = list
            .split([',', ':'])
            .map(|part| PathBuf::from(part.trim()))
            .filter(|p| !p.as_os_str().is_empty() && p.exists())
            .collect();
        if !out.is_empty() {
            return out;
        }
    }

    let dir = std::env::var("FUZZ_EX_DIR").unwrap_or_else(|_| "parser_tests".into());
    let Ok(rd) = fs::read_dir(Path::new(&dir)) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = rd
        .flatten()
        .map(|ent| ent.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("cfg"))
        })
        .collect();
    out.sort();
    out
}

// ---------- save / replay helpers ----------

#[derive(serde::Serialize)]
struct CaseMeta<'a> {
    unix_ts: u64,
    seed: u64,
    iter: usize,
    actual_bytes: usize,
    note: &'a str,
}

fn save_case(dir: &str, seed: u64, iter: usize, src: &str) -> std::io::Result<PathBuf> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let path = Path::new(dir).join(format!("case_s{seed}_i{iter}_n{}.cfg", src.len()));
    fs::write(&path, src.as_bytes())?;

    let meta = CaseMeta {
        unix_ts: ts,
        seed,
        iter,
        actual_bytes: src.len(),
        note: "Replay with: FUZZ_INPUT=<this file> cargo run --bin fuzz_parse",
    };
    let mut f = fs::File::create(path.with_extension("json"))?;
    let json = serde_json::to_string_pretty(&meta).map_err(std::io::Error::other)?;
    writeln!(f, "{json}")?;
    Ok(path)
}

// ---------- diagnostics ----------

fn first_difference(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .position(|(x, y)| x != y)
        .unwrap_or(a.len().min(b.len()))
}

fn line_col_at(src: &str, byte_idx: usize) -> (usize, usize) {
    // 1-based line/col
    let mut line = 1usize;
    let mut col = 1usize;
    for (i, ch) in src.char_indices() {
        if i >= byte_idx {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn dump_src_window(src: &str, at: usize) {
    let mut lo = at.saturating_sub(24);
    while !src.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (at + 24).min(src.len());
    while !src.is_char_boundary(hi) {
        hi += 1;
    }
    let (line, col) = line_col_at(src, at);
    eprintln!("--- source near byte {at} (line {line}, col {col}) ---");
    eprintln!("{:?}", &src[lo..hi]);
}

fn dump_first_leaf_diff(a: &Option<ParseNode>, b: &Option<ParseNode>) {
    let la = a.as_ref().map(|t| t.leaves()).unwrap_or_default();
    let lb = b.as_ref().map(|t| t.leaves()).unwrap_or_default();
    let i = la
        .iter()
        .zip(&lb)
        .position(|(x, y)| x.symbol != y.symbol || x.value != y.value)
        .unwrap_or(la.len().min(lb.len()));
    eprintln!("--- leaves from #{i} (LL | LALR) ---");
    for j in i..(i + 6).min(la.len().max(lb.len())) {
        let x = la.get(j).map(|n| (n.symbol.as_str(), n.value.as_deref()));
        let y = lb.get(j).map(|n| (n.symbol.as_str(), n.value.as_deref()));
        let mark = if x == y { "✅" } else { "❌" };
        eprintln!("{mark} #{j:06} {x:?} | {y:?}");
    }
}
