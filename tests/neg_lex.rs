//! Lexer behaviour on malformed input: every failure must come out as an
//! error token, and the token spans must still tile the input.

use tabula::{
    Token, Tokenizer,
    tables::{GrammarTables, script::sym, script_tables},
    tokenize,
};

fn tables() -> &'static GrammarTables {
    script_tables().expect("built-in grammar loads")
}

/// Non-hidden tokens as `(symbol, text)`, end-of-stream included.
fn visible(src: &str) -> Vec<(tabula::SymbolId, &str)> {
    let t = tables();
    tokenize(t, src)
        .filter(|tok| !t.is_hidden(tok.symbol))
        .map(|tok| (tok.symbol, tok.text))
        .collect()
}

fn all(src: &str) -> Vec<Token<'_>> {
    tokenize(tables(), src).collect()
}

#[test]
fn unterminated_string_spans_to_end_of_input() {
    let src = "s=\"hello";
    assert_eq!(
        visible(src),
        vec![
            (sym::SYMBOL, "s"),
            (sym::SPECIFIER, "="),
            (sym::ERROR, "\"hello"),
            (sym::EOF, ""),
        ]
    );
}

#[test]
fn unterminated_string_swallows_newlines() {
    let src = "a = \"one\ntwo = 2";
    let toks = all(src);
    let err = toks.iter().find(|t| t.symbol == sym::ERROR).expect("error token");
    assert_eq!(err.text, "\"one\ntwo = 2");
    assert_eq!((err.line, err.column, err.offset), (1, 5, 4));
}

#[test]
fn unknown_char_is_one_error_token() {
    let src = "a = $ b";
    assert_eq!(
        visible(src),
        vec![
            (sym::SYMBOL, "a"),
            (sym::SPECIFIER, "="),
            (sym::ERROR, "$"),
            (sym::SYMBOL, "b"),
            (sym::EOF, ""),
        ]
    );
}

#[test]
fn multibyte_error_consumes_whole_char() {
    let toks = all("é=1");
    assert_eq!(toks[0].symbol, sym::ERROR);
    assert_eq!(toks[0].text, "é");
    assert_eq!(toks[1].offset, 2);
    assert_eq!(toks[1].column, 2);
    assert_eq!(toks[1].symbol, sym::SPECIFIER);
}

#[test]
fn walk_ending_in_non_accepting_state_is_an_error() {
    // "1." stops in the state between integer and real.
    assert_eq!(
        visible("x = 1."),
        vec![
            (sym::SYMBOL, "x"),
            (sym::SPECIFIER, "="),
            (sym::ERROR, "1."),
            (sym::EOF, ""),
        ]
    );
    // A lone '-' or '!' never reaches an accepting state either.
    assert_eq!(visible("-")[0], (sym::ERROR, "-"));
    assert_eq!(visible("!x")[..2], [(sym::ERROR, "!"), (sym::SYMBOL, "x")]);
}

#[test]
fn operators_take_the_longest_match() {
    let specs: Vec<&str> = visible("a<=1 b>=2 c==3 d!=4 e<5")
        .into_iter()
        .filter(|(s, _)| *s == sym::SPECIFIER)
        .map(|(_, t)| t)
        .collect();
    assert_eq!(specs, ["<=", ">=", "==", "!=", "<"]);
}

#[test]
fn escaped_quotes_do_not_end_strings() {
    assert_eq!(
        visible(r#"k = "a\"b" c"#),
        vec![
            (sym::SYMBOL, "k"),
            (sym::SPECIFIER, "="),
            (sym::STRING, r#""a\"b""#),
            (sym::SYMBOL, "c"),
            (sym::EOF, ""),
        ]
    );
    assert_eq!(visible(r#""\\" x"#)[0], (sym::STRING, r#""\\""#));
}

#[test]
fn comments_and_whitespace_are_hidden_tokens() {
    let toks = all("# note\nx");
    let kinds: Vec<_> = toks.iter().map(|t| t.symbol).collect();
    assert_eq!(kinds, [sym::COMMENT, sym::WHITESPACE, sym::SYMBOL, sym::EOF]);
    assert_eq!(toks[0].text, "# note");
    assert_eq!((toks[2].line, toks[2].column, toks[2].offset), (2, 1, 7));
}

#[test]
fn end_of_stream_repeats_forever() {
    let t = tables();
    let mut lx = Tokenizer::new(t, "a");
    assert_eq!(lx.next_token().symbol, sym::SYMBOL);
    for _ in 0..5 {
        let eos = lx.next_token();
        assert_eq!(eos.symbol, sym::EOF);
        assert_eq!(eos.text, "");
        assert_eq!(eos.offset, 1);
    }
}

#[test]
fn token_stream_ends_with_exactly_one_end_of_stream() {
    let toks = all("a = { b }");
    assert_eq!(toks.last().map(|t| t.symbol), Some(sym::EOF));
    assert_eq!(toks.iter().filter(|t| t.symbol == sym::EOF).count(), 1);
    assert_eq!(all("").len(), 1);
}

#[test]
fn restart_resets_line_and_column() {
    let t = tables();
    let mut lx = Tokenizer::new(t, "a\n\nb");
    while lx.next_token().symbol != sym::EOF {}
    assert_eq!(lx.position().line, 3);

    lx.restart("zz");
    let tok = lx.next_token();
    assert_eq!((tok.text, tok.line, tok.column, tok.offset), ("zz", 1, 1, 0));
}

#[test]
fn error_tokens_still_tile_the_input() {
    for src in [
        "s=\"hello",
        "$$$",
        "a = 1. b = -",
        "{ é } \u{1F600} \"x",
        "\0\0",
        "1.2.",
    ] {
        let rebuilt: String = all(src).iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, src);
    }
}
