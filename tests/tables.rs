//! Grammar asset loading: the built-in tables, both codecs, and rejection of
//! malformed assets.

use std::path::PathBuf;

use serde_json::{Value, json};
use tabula::{
    PredictiveParser, ShiftReduceParser, TableError,
    tables::{
        Action, BlockEnd, GrammarTables, SymbolId, SymbolKind, encode_tables_bin,
        load_tables_bin_bytes, load_tables_bytes, load_tables_file, load_tables_json_bytes,
        save_tables_bin, save_tables_json,
        script::{SCRIPT_GRAMMAR_JSON, sym},
        script_tables,
    },
};

fn tables() -> &'static GrammarTables {
    let _ = env_logger::builder().is_test(true).try_init();
    script_tables().expect("built-in grammar loads")
}

fn asset() -> Value {
    serde_json::from_str(SCRIPT_GRAMMAR_JSON).expect("asset is JSON")
}

fn load(v: &Value) -> Result<GrammarTables, TableError> {
    load_tables_json_bytes(&serde_json::to_vec(v).expect("serialize"))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tabula_{}_{name}", std::process::id()))
}

#[test]
fn built_in_grammar_shape() {
    let t = tables();
    assert_eq!(t.name, "script");
    assert_eq!(t.symbols.len(), 19);
    assert_eq!(t.nonterminal_count, 7);
    assert_eq!(t.terminal_count(), 12);
    assert_eq!(t.rules.len(), 16);
    assert_eq!(t.dfa.states.len(), 17);
    assert_eq!(t.lalr().expect("lalr").state_count(), 21);
    assert_eq!(t.start_symbol, sym::CONFIG);
    assert_eq!(t.end_of_stream, sym::EOF);
    assert_eq!(t.error, sym::ERROR);
}

#[test]
fn symbol_metadata_lookups() {
    let t = tables();
    assert_eq!(t.lookup("Specifier"), Some(sym::SPECIFIER));
    assert_eq!(t.lookup("nope"), None);
    assert_eq!(t.name(sym::BLOCK), "Block");
    assert_eq!(t.name(SymbolId(999)), "?");
    assert_eq!(t.attribute(sym::REAL, "literal"), Some("real"));
    assert_eq!(t.attribute(SymbolId(999), "literal"), None);
    assert_eq!(t.symbol(sym::DATE).and_then(|s| s.substitute), Some(sym::SYMBOL));
    assert!(t.is_hidden(sym::COMMENT));
    assert!(!t.is_hidden(sym::STRING));
    assert!(t.symbol(sym::STATEMENTS).is_some_and(|s| s.collapsed));
    assert!(t.is_nonterminal(sym::BLOCK));
    assert!(!t.is_nonterminal(sym::EOF));
    assert_eq!(
        t.block_end(sym::STRING),
        Some(&BlockEnd {
            symbol: sym::STRING,
            terminator: "\"".into(),
            escape: Some('\\'),
        })
    );
    assert_eq!(t.block_end(sym::SYMBOL), None);
}

#[test]
fn parse_table_lookups() {
    let t = tables();
    let ll = t.ll().expect("ll");
    assert_eq!(ll.get(sym::CONFIG, sym::EOF).map(|r| r.0), Some(1));
    assert_eq!(ll.get(sym::BLOCK, sym::LBRACE).map(|r| r.0), Some(15));
    assert_eq!(ll.get(sym::BLOCK, sym::SYMBOL), None);
    // Terminal as row, non-terminal as column: both are misses.
    assert_eq!(ll.get(sym::SYMBOL, sym::SYMBOL), None);
    assert_eq!(ll.get(sym::CONFIG, sym::BLOCK), None);
    assert_eq!(
        ll.expected(sym::VALUE),
        vec![sym::LBRACE, sym::SYMBOL, sym::STRING, sym::INTEGER, sym::REAL, sym::DATE]
    );

    let lalr = t.lalr().expect("lalr");
    assert_eq!(lalr.action(1, sym::EOF), Some(Action::Accept));
    assert_eq!(lalr.action(0, sym::SYMBOL), Some(Action::Shift(5)));
    assert_eq!(lalr.goto(0, sym::CONFIG), Some(1));
    assert_eq!(lalr.goto(0, sym::SYMBOL), None);
    assert_eq!(lalr.action(15, sym::RBRACE), Some(Action::Shift(20)));
    assert_eq!(lalr.expected(15), vec![sym::RBRACE]);
}

#[test]
fn compact_round_trip() {
    let t = tables();
    let bytes = encode_tables_bin(t).expect("encode");
    assert_eq!(&bytes[..8], b"TBGRAM01");
    let back = load_tables_bin_bytes(&bytes).expect("decode");
    assert_eq!(back.symbols, t.symbols);
    assert_eq!(back.rules, t.rules);
    assert_eq!(back.dfa, t.dfa);
    assert_eq!(back.block_ends, t.block_ends);
    assert_eq!(back.ll, t.ll);
    assert_eq!(back.lalr, t.lalr);
    assert_eq!(encode_tables_bin(&back).expect("re-encode"), bytes);

    // The sniffing loader picks the codec by magic.
    let sniffed = load_tables_bytes(&bytes).expect("sniffed binary");
    assert_eq!(sniffed.symbols, t.symbols);
    let sniffed = load_tables_bytes(SCRIPT_GRAMMAR_JSON.as_bytes()).expect("sniffed json");
    assert_eq!(sniffed.rules, t.rules);
}

#[test]
fn files_round_trip() {
    let t = tables();
    let json_path = temp_path("script.json");
    let bin_path = temp_path("script.bin");
    save_tables_json(&json_path, t).expect("save json");
    save_tables_bin(&bin_path, t).expect("save bin");

    let from_json = load_tables_file(&json_path).expect("load json");
    let from_bin = load_tables_file(&bin_path).expect("load bin");
    assert_eq!(from_json.dfa, t.dfa);
    assert_eq!(from_bin.lalr, t.lalr);
    assert_eq!(
        encode_tables_bin(&from_json).expect("encode"),
        encode_tables_bin(&from_bin).expect("encode")
    );
    let _ = std::fs::remove_file(json_path);
    let _ = std::fs::remove_file(bin_path);

    assert!(matches!(
        load_tables_file(&temp_path("missing.json")),
        Err(TableError::Io(_))
    ));
}

#[test]
fn compact_rejects_damaged_bytes() {
    let bytes = encode_tables_bin(tables()).expect("encode");

    let mut bad = bytes.clone();
    bad[0] = b'X';
    assert!(matches!(load_tables_bin_bytes(&bad), Err(TableError::BadMagic)));

    for cut in [4, 8, 12, bytes.len() / 2, bytes.len() - 1] {
        assert!(
            matches!(load_tables_bin_bytes(&bytes[..cut]), Err(TableError::Truncated(_))),
            "cut at {cut}"
        );
    }

    // Version field sits right after the magic.
    let mut v2 = bytes.clone();
    v2[8..12].copy_from_slice(&2u32.to_le_bytes());
    assert!(matches!(
        load_tables_bin_bytes(&v2),
        Err(TableError::UnsupportedVersion { found: 2, supported: 1 })
    ));
}

#[test]
fn json_rejects_wrong_format_and_version() {
    let mut v = asset();
    v["format"] = json!("something-else");
    assert!(matches!(load(&v), Err(TableError::UnknownFormat(_))));

    let mut v = asset();
    v["version"] = json!(7);
    assert!(matches!(
        load(&v),
        Err(TableError::UnsupportedVersion { found: 7, .. })
    ));

    assert!(matches!(
        load_tables_json_bytes(b"{ not json"),
        Err(TableError::Json(_))
    ));
}

#[test]
fn validation_rejects_inconsistent_tables() {
    // Start symbol must be a non-terminal.
    let mut v = asset();
    v["start_symbol"] = json!(14);
    assert!(matches!(load(&v), Err(TableError::WrongKind { id: 14, .. })));

    // End-of-stream id must name the end-of-stream symbol.
    let mut v = asset();
    v["end_of_stream"] = json!(8);
    assert!(matches!(load(&v), Err(TableError::WrongKind { id: 8, .. })));

    // Non-terminals must come first.
    let mut v = asset();
    v["symbols"][9]["kind"] = json!("non_terminal");
    assert!(matches!(load(&v), Err(TableError::Layout { id: 9, .. })));

    let mut v = asset();
    v["symbols"][12]["name"] = json!("{");
    assert!(matches!(load(&v), Err(TableError::DuplicateName(_))));

    let mut v = asset();
    v["dfa"]["states"][0]["edges"][0]["target"] = json!(99);
    assert!(matches!(
        load(&v),
        Err(TableError::OutOfRange { what: "DFA edge target", id: 99, .. })
    ));

    let mut v = asset();
    v["dfa"]["states"][3]["accept"] = json!(2);
    assert!(matches!(load(&v), Err(TableError::WrongKind { id: 2, .. })));

    let mut v = asset();
    v["block_ends"][0]["terminator"] = json!("");
    assert!(matches!(load(&v), Err(TableError::EmptyTerminator(_))));

    // An LL(1) cell in Config's row pointing at a Block rule.
    let mut v = asset();
    assert_eq!(v["ll"]["entries"][0], json!([0, 7, 1]));
    v["ll"]["entries"][0] = json!([0, 7, 15]);
    assert!(matches!(load(&v), Err(TableError::RuleMismatch { rule: 15, .. })));

    let mut v = asset();
    assert_eq!(v["lalr"]["states"][0]["actions"][0], json!([7, {"reduce": 1}]));
    v["lalr"]["states"][0]["actions"][0] = json!([7, {"shift": 400}]);
    assert!(matches!(
        load(&v),
        Err(TableError::OutOfRange { what: "LALR(1) shift target", .. })
    ));

    let mut v = asset();
    v["lalr"]["states"][0]["gotos"][0] = json!([11, 1]);
    assert!(matches!(
        load(&v),
        Err(TableError::OutOfRange { what: "LALR(1) goto symbol", .. })
    ));

    let mut v = asset();
    v["symbols"][18]["substitute"] = json!(500);
    assert!(matches!(
        load(&v),
        Err(TableError::OutOfRange { what: "substitute symbol", .. })
    ));
}

#[test]
fn engines_need_their_table() {
    let mut v = asset();
    v.as_object_mut().expect("object").remove("ll");
    let no_ll = load(&v).expect("LALR-only grammar is valid");
    assert!(matches!(
        PredictiveParser::new(&no_ll, "a = 1"),
        Err(TableError::MissingLlTable(_))
    ));
    assert!(ShiftReduceParser::new(&no_ll, "a = 1").is_ok());

    let mut v = asset();
    v.as_object_mut().expect("object").remove("lalr");
    let no_lalr = load(&v).expect("LL-only grammar is valid");
    assert!(matches!(
        tabula::parse_str(
            &no_lalr,
            "a = 1",
            tabula::Strategy::ShiftReduce,
            &Default::default()
        ),
        Err(TableError::MissingLalrTable(_))
    ));
    assert!(no_lalr.symbols.iter().any(|s| s.kind == SymbolKind::Hidden));
}
