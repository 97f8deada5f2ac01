// src/tree/literal.rs
// Typed scalar values. Which terminals carry which literal kind is grammar
// data: the symbol's `literal` attribute (`symbol`, `string`, `integer`, `real`).

use std::fmt;

use serde::Serialize;

use super::ParseNode;
use crate::tables::GrammarTables;

pub const LITERAL_ATTRIBUTE: &str = "literal";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Symbol(String),
    /// Unquoted and unescaped.
    String(String),
    Integer(i64),
    Real(f64),
}

impl Literal {
    /// Literal value of a leaf, if its symbol declares one and the text parses.
    pub fn from_node(tables: &GrammarTables, node: &ParseNode) -> Option<Literal> {
        if node.is_error {
            return None;
        }
        let text = node.value.as_deref()?;
        let kind = tables.attribute(node.symbol_id, LITERAL_ATTRIBUTE)?;
        Self::parse(kind, text)
    }

    pub fn parse(kind: &str, text: &str) -> Option<Literal> {
        match kind {
            "symbol" => Some(Literal::Symbol(text.to_string())),
            "string" => unquote(text).map(Literal::String),
            "integer" => text.parse().ok().map(Literal::Integer),
            "real" => text.parse().ok().map(Literal::Real),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Symbol(s) | Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(i) => Some(*i as f64),
            Literal::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Symbol(s) => f.write_str(s),
            Literal::String(s) => {
                f.write_str("\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        _ => write!(f, "{ch}")?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Real(r) => write!(f, "{r:.4}"),
        }
    }
}

/// Strips the surrounding quotes and resolves backslash escapes.
fn unquote(text: &str) -> Option<String> {
    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Some(out)
}

