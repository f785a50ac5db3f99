//! Tokenizer for the grammar section of a specification file.
//!
//! Action blocks are a single token: the callback on `{` tracks nesting
//! depth, so bodies may contain braces freely and span lines. The lexer
//! extras carry the running newline count for diagnostics.

use logos::{Lexer, Logos};

use crate::error::{GenError, Result};

#[derive(Default, Debug, Clone, PartialEq)]
pub enum LexError {
    #[default]
    Unexpected,
    UnclosedAction,
}

/// Consumes a brace-matched action block starting just past the opening
/// `{`; returns the whole block, braces included.
fn action_block(lex: &mut Lexer<Tok>) -> std::result::Result<String, LexError> {
    let rem = lex.remainder();
    let mut depth = 1usize;
    for (i, c) in rem.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let body = &rem[..i];
                    lex.extras += body.matches('\n').count();
                    lex.bump(i + 1);
                    return Ok(format!("{{{body}}}"));
                }
            }
            _ => {}
        }
    }
    Err(LexError::UnclosedAction)
}

fn count_line(lex: &mut Lexer<Tok>) {
    lex.extras += 1;
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(error = LexError)]
#[logos(extras = usize)]
pub enum Tok {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[token(":")]
    Colon,

    #[token("{", action_block)]
    Action(String),

    #[token("\n", count_line)]
    LineFeed,
}

impl std::fmt::Display for Tok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(name) => write!(f, "{}", name),
            Tok::Colon => f.write_str(":"),
            Tok::Action(_) => f.write_str("{...}"),
            Tok::LineFeed => f.write_str("end of line"),
        }
    }
}

/// Tokens plus the source line each one started on.
#[derive(Debug)]
pub struct TokenStream {
    pub toks: Vec<Tok>,
    pub lines: Vec<usize>,
}

/// Tokenizes the grammar section. `first_line` is the 1-based line number
/// of the section's first line within the whole spec file.
pub fn tokenize(input: &str, first_line: usize) -> Result<TokenStream> {
    let mut lex = Tok::lexer(input);
    let mut toks = Vec::new();
    let mut lines = Vec::new();

    loop {
        let line = first_line + lex.extras;
        match lex.next() {
            Some(Ok(tok)) => {
                toks.push(tok);
                lines.push(line);
            }
            Some(Err(e)) => {
                let cause = match e {
                    LexError::UnclosedAction => "unclosed action block".to_owned(),
                    LexError::Unexpected => {
                        format!("unexpected character {:?}", lex.slice())
                    }
                };
                return Err(GenError::SpecSyntax { line, cause });
            }
            None => break,
        }
    }

    // every production is line-terminated, including the last one
    if toks.last().is_some_and(|t| *t != Tok::LineFeed) {
        toks.push(Tok::LineFeed);
        lines.push(first_line + lex.extras);
    }

    Ok(TokenStream { toks, lines })
}
