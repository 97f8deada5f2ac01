//! End-to-end parses of small documents through both engines.

use pretty_assertions::assert_eq;
use tabula::{
    Literal, ParseEngine, ParseNode, ParseOptions, PredictiveParser, ShiftReduceParser, Strategy,
    SymbolId, parse, parse_str,
    tables::{
        GrammarTables,
        io::GrammarDisk,
        script::{SCRIPT_GRAMMAR_JSON, sym},
        script_tables,
    },
};

fn init() -> &'static GrammarTables {
    let _ = env_logger::builder().is_test(true).try_init();
    script_tables().expect("built-in grammar loads")
}

fn parse_both(src: &str, options: &ParseOptions) -> ParseNode {
    let t = init();
    let ll = parse_str(t, src, Strategy::Predictive, options).expect("LL(1) table");
    let lalr = parse_str(t, src, Strategy::ShiftReduce, options).expect("LALR(1) table");
    assert_eq!(ll, lalr, "engines disagree on {src:?}");
    ll.expect("non-empty document")
}

fn leaf(symbol: &str, id: SymbolId, value: &str, line: u32, column: u32, offset: usize) -> ParseNode {
    ParseNode {
        symbol: symbol.to_string(),
        symbol_id: id,
        value: Some(value.to_string()),
        children: Vec::new(),
        is_hidden: false,
        is_collapsed: false,
        is_error: false,
        substitute_for: None,
        line,
        column,
        offset,
        length: value.len(),
    }
}

fn inner(symbol: &str, id: SymbolId, children: Vec<ParseNode>) -> ParseNode {
    let first = &children[0];
    let last = &children[children.len() - 1];
    ParseNode {
        symbol: symbol.to_string(),
        symbol_id: id,
        value: None,
        line: first.line,
        column: first.column,
        offset: first.offset,
        length: last.offset + last.length - first.offset,
        children,
        is_hidden: false,
        is_collapsed: false,
        is_error: false,
        substitute_for: None,
    }
}

fn leaf_values(node: &ParseNode) -> Vec<&str> {
    node.leaves()
        .into_iter()
        .filter_map(|n| n.value.as_deref())
        .collect()
}

#[test]
fn assignment_of_a_string() {
    let tree = parse_both(r#"a = "hello""#, &ParseOptions::default());
    let expected = inner(
        "Config",
        sym::CONFIG,
        vec![inner(
            "Statement",
            sym::STATEMENT,
            vec![
                leaf("Symbol", sym::SYMBOL, "a", 1, 1, 0),
                leaf("Specifier", sym::SPECIFIER, "=", 1, 3, 2),
                leaf("String", sym::STRING, "\"hello\"", 1, 5, 4),
            ],
        )],
    );
    assert_eq!(tree, expected);
    assert_eq!(tree.length, 11);

    let t = init();
    let value = tree.leaves()[2];
    assert_eq!(
        Literal::from_node(t, value),
        Some(Literal::String("hello".into()))
    );
}

#[test]
fn block_of_bare_strings_keeps_order() {
    let tree = parse_both(r#"tags = { "x" "y" }"#, &ParseOptions::default());
    let t = init();
    let block = tree.find("Block").expect("block node");
    assert_eq!(block.children.len(), 4);
    assert_eq!(block.children[0].value.as_deref(), Some("{"));
    assert_eq!(block.children[3].value.as_deref(), Some("}"));

    let strings: Vec<Literal> = block
        .leaves()
        .into_iter()
        .filter(|n| n.symbol_id == sym::STRING)
        .filter_map(|n| Literal::from_node(t, n))
        .collect();
    assert_eq!(
        strings,
        vec![Literal::String("x".into()), Literal::String("y".into())]
    );

    let statement = &tree.children[0];
    assert_eq!(leaf_values(statement)[..2], ["tags", "="]);
    assert_eq!(statement.children[2].symbol, "Block");
}

#[test]
fn unterminated_string_becomes_an_error_node() {
    let t = init();
    let src = r#"name = "oops"#;
    for strategy in Strategy::ALL {
        let tree = parse_str(t, src, strategy, &ParseOptions::default())
            .expect("tables")
            .expect("tree");
        assert_eq!(tree.symbol, "Config");
        let errors = tree.errors();
        assert_eq!(errors.len(), 1, "{strategy:?}");
        let err = errors[0];
        assert_eq!(err.value.as_deref(), Some("\"oops"));
        assert_eq!((err.line, err.column, err.offset), (1, 8, 7));
        assert_eq!(err.symbol_id, sym::ERROR);
        assert!(leaf_values(&tree).starts_with(&["name", "="]));
    }
}

#[test]
fn real_literal() {
    let t = init();
    let tree = parse_both("x = 1.5", &ParseOptions::default());
    let value = tree.leaves()[2];
    assert_eq!(value.symbol, "Real");
    let lit = Literal::from_node(t, value).expect("real literal");
    assert_eq!(lit, Literal::Real(1.5));
    assert_eq!(lit.to_string(), "1.5000");
}

#[test]
fn negative_integer_literal() {
    let t = init();
    let tree = parse_both("speed = -3", &ParseOptions::default());
    let value = tree.leaves()[2];
    assert_eq!(value.symbol, "Integer");
    assert_eq!(value.value.as_deref(), Some("-3"));
    assert_eq!(Literal::from_node(t, value), Some(Literal::Integer(-3)));
}

fn reuse_engine<'src, E: ParseEngine<'src>>(engine: &mut E) {
    let options = ParseOptions::default();
    let first = parse(engine, &options).expect("first tree");
    assert_eq!(leaf_values(&first), ["a", "=", "1"]);

    engine.restart("b=2");
    let second = parse(engine, &options).expect("second tree");
    assert_eq!(leaf_values(&second), ["b", "=", "2"]);
    assert_eq!(second.offset, 0);
    assert_eq!(second.length, 3);
    assert_eq!(second, parse_both("b=2", &options));
}

#[test]
fn engine_reuse_leaves_no_residue() {
    let t = init();
    reuse_engine(&mut PredictiveParser::new(t, "a=1").expect("LL(1) table"));
    reuse_engine(&mut ShiftReduceParser::new(t, "a=1").expect("LALR(1) table"));
}

#[test]
fn dates_are_substituted_by_symbols() {
    let tree = parse_both("start = 1444.11.11", &ParseOptions::default());
    let date = tree.leaves()[2];
    assert_eq!(date.symbol, "Symbol");
    assert_eq!(date.symbol_id, sym::SYMBOL);
    assert_eq!(date.substitute_for.as_deref(), Some("Date"));
    assert_eq!(
        Literal::from_node(init(), date),
        Some(Literal::Symbol("1444.11.11".into()))
    );

    let raw = ParseOptions {
        transform: false,
        ..ParseOptions::default()
    };
    let tree = parse_both("start = 1444.11.11", &raw);
    let date = tree.leaves()[2];
    assert_eq!(date.symbol, "Date");
    assert_eq!(date.substitute_for, None);
}

/// The built-in grammar with blocks reported as plain values.
fn blocks_as_values() -> GrammarTables {
    let mut disk: GrammarDisk = serde_json::from_str(SCRIPT_GRAMMAR_JSON).expect("grammar json");
    disk.symbols[sym::BLOCK.index()].substitute = Some(sym::VALUE);
    disk.into_tables().expect("grammar with block substitute")
}

#[test]
fn inner_nodes_are_substituted_too() {
    let t = blocks_as_values();
    let src = "a = { b }";
    let options = ParseOptions::default();
    let ll = parse_str(&t, src, Strategy::Predictive, &options).expect("LL(1) table");
    let lalr = parse_str(&t, src, Strategy::ShiftReduce, &options).expect("LALR(1) table");
    assert_eq!(ll, lalr);
    let tree = ll.expect("tree");
    assert!(tree.find("Block").is_none());
    let value = tree.find("Value").expect("substituted block");
    assert_eq!(value.symbol_id, sym::VALUE);
    assert_eq!(value.substitute_for.as_deref(), Some("Block"));
    assert_eq!(leaf_values(value), ["{", "b", "}"]);
    assert!(tree.to_string().contains("Value (for Block)"));

    let raw = ParseOptions {
        transform: false,
        ..ParseOptions::default()
    };
    let tree = parse_str(&t, src, Strategy::ShiftReduce, &raw)
        .expect("LALR(1) table")
        .expect("tree");
    let block = tree.find("Block").expect("block kept without transform");
    assert_eq!(block.symbol_id, sym::BLOCK);
    assert_eq!(block.substitute_for, None);
}

#[test]
fn empty_rules_sit_after_the_last_token() {
    let raw = ParseOptions {
        trim: true,
        transform: false,
        show_hidden: false,
    };
    let src = "a\n\n\n   b";
    let tree = parse_both(src, &raw);
    let statements = tree.find_all("Statement");
    assert_eq!(statements.len(), 2);
    assert_eq!((statements[0].offset, statements[0].length), (0, 1));
    assert_eq!(statements[0].source_text(), "a");
    assert_eq!((statements[1].offset, statements[1].length), (7, 1));

    let tail = statements[0].find("StatementTail").expect("empty tail");
    assert!(tail.children.is_empty());
    assert_eq!((tail.line, tail.column, tail.offset, tail.length), (1, 2, 1, 0));
    assert_eq!(tree.length, src.len());

    // With whitespace in the tree, every span is exactly its text.
    let shown = ParseOptions {
        show_hidden: true,
        ..raw
    };
    let tree = parse_both(src, &shown);
    tree.walk(&mut |n| {
        let span = &src[n.offset..n.offset + n.length];
        assert_eq!(span, n.source_text().as_str(), "{}", n.symbol);
    });
}

#[test]
fn nested_blocks() {
    let src = "outer = {\n  inner = { level = 2 }\n  flag = yes\n}\n";
    let tree = parse_both(src, &ParseOptions::default());
    assert!(!tree.has_errors());
    assert_eq!(tree.find_all("Block").len(), 2);
    assert_eq!(tree.find_all("Statement").len(), 4);
    assert_eq!(
        leaf_values(&tree),
        ["outer", "=", "{", "inner", "=", "{", "level", "=", "2", "}", "flag", "=", "yes", "}"]
    );
    let inner_block = tree.find_all("Block")[1];
    assert_eq!((inner_block.line, inner_block.column), (2, 11));
}

#[test]
fn without_trim_single_child_rules_keep_their_node() {
    let trimmed = parse_both("x = 1", &ParseOptions::default());
    assert!(trimmed.find("Value").is_none());

    let untrimmed = parse_both(
        "x = 1",
        &ParseOptions {
            trim: false,
            ..ParseOptions::default()
        },
    );
    let value = untrimmed.find("Value").expect("value node");
    assert_eq!(leaf_values(value), ["1"]);
    assert_eq!(leaf_values(&untrimmed), leaf_values(&trimmed));
}

#[test]
fn without_transform_collapsed_nodes_stay() {
    let raw = ParseOptions {
        trim: true,
        transform: false,
        show_hidden: false,
    };
    let tree = parse_both("a = 1 b = 2", &raw);
    let collapsed: Vec<&str> = ["Statements", "StatementTail", "Scalar"]
        .into_iter()
        .filter(|s| tree.find(s).is_some())
        .collect();
    assert_eq!(collapsed, ["Statements", "StatementTail", "Scalar"]);
    assert!(tree.find("Statements").is_some_and(|n| n.is_collapsed));
    assert_eq!(leaf_values(&tree), ["a", "=", "1", "b", "=", "2"]);
}

#[test]
fn only_empty_productions_are_childless() {
    let t = init();
    let raw = ParseOptions {
        trim: true,
        transform: false,
        show_hidden: false,
    };
    let tree = parse_both("a = { b c = { } } d", &raw);
    let mut empty = Vec::new();
    tree.walk(&mut |n| {
        if !n.is_leaf() && n.children.is_empty() {
            empty.push(n.symbol_id);
        }
    });
    assert!(!empty.is_empty());
    for id in empty {
        assert!(
            t.rules.iter().any(|r| r.lhs == id && r.is_empty_production()),
            "{} has no empty rule",
            t.name(id)
        );
    }
}

#[test]
fn hidden_tokens_only_when_asked() {
    let src = "# header\na = 1 # trailing\n";
    let plain = parse_both(src, &ParseOptions::default());
    assert_eq!(leaf_values(&plain), ["a", "=", "1"]);

    let visible = parse_both(
        src,
        &ParseOptions {
            show_hidden: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(visible.source_text(), src);
    let comments = visible.find_all("Comment");
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.is_hidden));
}

#[test]
fn empty_documents_have_no_tree() {
    let t = init();
    for src in ["", "   \n\t", "# only a comment"] {
        for strategy in Strategy::ALL {
            let tree = parse_str(t, src, strategy, &ParseOptions::default()).expect("tables");
            assert_eq!(tree, None, "{strategy:?} on {src:?}");
        }
    }
}

#[test]
fn literal_parsing() {
    assert_eq!(
        Literal::parse("string", r#""a\"b\\c""#),
        Some(Literal::String(r#"a"b\c"#.into()))
    );
    assert_eq!(
        Literal::parse("string", r#""line\n""#),
        Some(Literal::String("line\n".into()))
    );
    assert_eq!(Literal::parse("string", "bare"), None);
    assert_eq!(Literal::parse("integer", "99999999999999999999"), None);
    assert_eq!(Literal::Real(2.0).to_string(), "2.0000");
    assert_eq!(Literal::String("x\"y".into()).to_string(), r#""x\"y""#);
}

#[test]
fn batch_parsing_keeps_input_order() {
    let t = init();
    let inputs: Vec<String> = (0..64).map(|i| format!("k{i} = {i}")).collect();
    let trees =
        tabula::parse_batch(t, &inputs, Strategy::ShiftReduce, &ParseOptions::default())
            .expect("tables");
    assert_eq!(trees.len(), inputs.len());
    for (i, tree) in trees.iter().enumerate() {
        let tree = tree.as_ref().expect("tree");
        let key = format!("k{i}");
        assert_eq!(leaf_values(tree)[0], key.as_str());
    }
}

#[test]
fn tree_serializes_to_json() {
    let tree = parse_both("d = 1444.1.1", &ParseOptions::default());
    let json = serde_json::to_value(&tree).expect("json");
    assert_eq!(json["symbol"], "Config");
    let leaf = &json["children"][0]["children"][2];
    assert_eq!(leaf["symbol"], "Symbol");
    assert_eq!(leaf["substitute_for"], "Date");
    assert_eq!(leaf["value"], "1444.1.1");
    assert!(leaf.get("is_error").is_none());

    let back: ParseNode = serde_json::from_value(json).expect("round trip");
    assert_eq!(back, tree);
}
