//! Specification-file reader.
//!
//! A spec file is `<lexical-section> %% <grammar-section>`. The lexical
//! section is line-oriented (`<pattern> <NAME>`); the grammar section is
//! tokenized and parsed into productions. The reader owns all line-number
//! bookkeeping so later phases can stay purely structural.

pub mod lexer;
pub mod parser;

use std::path::Path;

use chumsky::Parser as _;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GenError, Result};

/// Symbol name denoting ε on a production's right-hand side.
pub const EPSILON: &str = "eps";

/// An ordered lexical rule; earlier rules win ties in the built DFA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    pub name: String,
    pub pattern: String,
}

/// A grammar production. `action` is an opaque target-language fragment,
/// braces included, emitted verbatim after placeholder rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub id: usize,
    pub lhs: String,
    pub rhs: Vec<String>,
    pub action: String,
}

#[derive(Debug)]
pub struct SpecFile {
    pub tokens: Vec<TokenRule>,
    pub productions: Vec<Production>,
}

impl SpecFile {
    /// The lhs of the first grammar production.
    pub fn start_symbol(&self) -> &str {
        &self.productions[0].lhs
    }
}

// The token name is the last whitespace-delimited field, so patterns may
// contain spaces inside character classes.
static LEX_RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<pattern>.*\S)[ \t]+(?P<name>[A-Za-z_][A-Za-z0-9_]*)$").unwrap());

pub fn read_spec(path: impl AsRef<Path>) -> Result<SpecFile> {
    let content = std::fs::read_to_string(path)?;
    parse_spec(&content)
}

pub fn parse_spec(input: &str) -> Result<SpecFile> {
    let lines: Vec<&str> = input.lines().collect();

    // locate the %% separator: exactly one, on its own line
    let mut sep: Option<usize> = None;
    for (i, line) in lines.iter().enumerate() {
        if line.trim() == "%%" {
            if sep.is_some() {
                return Err(GenError::SpecSyntax {
                    line: i + 1,
                    cause: "duplicate `%%` separator".into(),
                });
            }
            sep = Some(i);
        }
    }
    let Some(sep) = sep else {
        return Err(GenError::SpecSyntax {
            line: lines.len().max(1),
            cause: "missing `%%` separator".into(),
        });
    };

    let tokens = parse_lexical_section(&lines[..sep])?;
    if tokens.is_empty() {
        return Err(GenError::SpecSyntax {
            line: sep + 1,
            cause: "lexical section has no rules".into(),
        });
    }

    let grammar_src = lines[sep + 1..].join("\n");
    let productions = parse_grammar_section(&grammar_src, sep + 2)?;
    if productions.is_empty() {
        return Err(GenError::SpecSyntax {
            line: sep + 1,
            cause: "grammar section has no productions".into(),
        });
    }

    debug!(
        "spec: {} lexical rules, {} productions",
        tokens.len(),
        productions.len()
    );
    Ok(SpecFile {
        tokens,
        productions,
    })
}

fn parse_lexical_section(lines: &[&str]) -> Result<Vec<TokenRule>> {
    let mut tokens = Vec::new();
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some(cap) = LEX_RULE_RE.captures(line) else {
            return Err(GenError::SpecSyntax {
                line: i + 1,
                cause: format!("expected `<pattern> <NAME>`, got {:?}", line),
            });
        };
        tokens.push(TokenRule {
            name: cap["name"].to_owned(),
            pattern: cap["pattern"].to_owned(),
        });
    }
    Ok(tokens)
}

fn parse_grammar_section(src: &str, first_line: usize) -> Result<Vec<Production>> {
    let stream = lexer::tokenize(src, first_line)?;
    let raw = match parser::parser().parse(stream.toks.as_slice()).into_result() {
        Ok(raw) => raw,
        Err(errs) => {
            let e = &errs[0];
            let idx = e.span().start;
            let line = stream
                .lines
                .get(idx)
                .or(stream.lines.last())
                .copied()
                .unwrap_or(first_line);
            return Err(GenError::SpecSyntax {
                line,
                cause: e.to_string(),
            });
        }
    };

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(id, p)| Production {
            id,
            lhs: p.lhs,
            // `eps` is a sentinel, not a symbol
            rhs: p.rhs.into_iter().filter(|s| s != EPSILON).collect(),
            action: p.action,
        })
        .collect())
}
