//! Regular-expression preprocessing and postfix conversion.
//!
//! Patterns are first expanded into a stream of tagged atoms: character
//! classes, shorthands and escapes all become plain alternation groups, so
//! the Thompson builder only ever sees literals, grouping and the three
//! closure operators. Literals are a distinct [`Atom`] variant, which is what
//! keeps an escaped `\*` from ever being read as the closure operator.

use crate::error::{GenError, Result};

/// One element of the expanded operator stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    /// A literal input character, escapes already resolved.
    Lit(char),
    LParen,
    RParen,
    Union,
    Concat,
    Star,
    Plus,
    Opt,
}

fn err(rule: &str, cause: impl Into<String>) -> GenError {
    GenError::RegexSyntax {
        rule: rule.to_owned(),
        cause: cause.into(),
    }
}

/// Expands `pattern` into an atom stream: classes and escapes become
/// alternation groups of literals, metacharacters become operators.
pub fn preprocess(pattern: &str, rule: &str) -> Result<Vec<Atom>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                i += 1;
                let Some(&esc) = chars.get(i) else {
                    return Err(err(rule, "dangling escape at end of pattern"));
                };
                match esc {
                    'n' => out.push(Atom::Lit('\n')),
                    't' => out.push(Atom::Lit('\t')),
                    'r' => out.push(Atom::Lit('\r')),
                    'd' | 'w' | 's' => push_group(&mut out, &shorthand(esc)),
                    _ if esc.is_ascii_alphanumeric() => {
                        return Err(err(rule, format!("unknown escape `\\{esc}`")));
                    }
                    _ => out.push(Atom::Lit(esc)),
                }
                i += 1;
            }
            '[' => {
                let (members, next) = parse_class(&chars, i + 1, rule)?;
                push_group(&mut out, &members);
                i = next;
            }
            ']' => return Err(err(rule, "unmatched `]`")),
            '(' => {
                out.push(Atom::LParen);
                i += 1;
            }
            ')' => {
                out.push(Atom::RParen);
                i += 1;
            }
            '|' => {
                out.push(Atom::Union);
                i += 1;
            }
            '*' => {
                out.push(Atom::Star);
                i += 1;
            }
            '+' => {
                out.push(Atom::Plus);
                i += 1;
            }
            '?' => {
                out.push(Atom::Opt);
                i += 1;
            }
            _ => {
                out.push(Atom::Lit(c));
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Members of a `\d`/`\w`/`\s` shorthand class.
fn shorthand(tag: char) -> Vec<char> {
    match tag {
        'd' => ('0'..='9').collect(),
        'w' => ('a'..='z')
            .chain('A'..='Z')
            .chain('0'..='9')
            .chain(std::iter::once('_'))
            .collect(),
        's' => vec![' ', '\t', '\r', '\n'],
        _ => unreachable!(),
    }
}

/// Parses a character class starting just past the `[`; returns the member
/// characters and the index just past the closing `]`.
fn parse_class(chars: &[char], start: usize, rule: &str) -> Result<(Vec<char>, usize)> {
    let mut members = Vec::new();
    let mut i = start;

    loop {
        let Some(&c) = chars.get(i) else {
            return Err(err(rule, "unclosed character class"));
        };
        match c {
            ']' => break,
            '\\' => {
                i += 1;
                let Some(&esc) = chars.get(i) else {
                    return Err(err(rule, "dangling escape in character class"));
                };
                match esc {
                    'n' => members.push('\n'),
                    't' => members.push('\t'),
                    'r' => members.push('\r'),
                    'd' | 'w' | 's' => members.extend(shorthand(esc)),
                    _ if esc.is_ascii_alphanumeric() => {
                        return Err(err(rule, format!("unknown escape `\\{esc}`")));
                    }
                    _ => members.push(esc),
                }
                i += 1;
            }
            '-' if !members.is_empty() && chars.get(i + 1).is_some_and(|&n| n != ']') => {
                // range: previous member .. next char
                let lo = members.pop().unwrap();
                i += 1;
                let hi = match chars[i] {
                    '\\' => {
                        i += 1;
                        match chars.get(i) {
                            Some('n') => '\n',
                            Some('t') => '\t',
                            Some('r') => '\r',
                            Some(&other) if !other.is_ascii_alphanumeric() => other,
                            _ => return Err(err(rule, "bad escape as range endpoint")),
                        }
                    }
                    other => other,
                };
                if hi < lo {
                    return Err(err(rule, format!("descending range `{lo}-{hi}`")));
                }
                members.extend(lo..=hi);
                i += 1;
            }
            _ => {
                members.push(c);
                i += 1;
            }
        }
    }

    if members.is_empty() {
        return Err(err(rule, "empty character class"));
    }
    Ok((members, i + 1))
}

/// Appends `( m1 | m2 | … )` to the stream.
fn push_group(out: &mut Vec<Atom>, members: &[char]) {
    out.push(Atom::LParen);
    for (k, &m) in members.iter().enumerate() {
        if k > 0 {
            out.push(Atom::Union);
        }
        out.push(Atom::Lit(m));
    }
    out.push(Atom::RParen);
}

/// Inserts explicit concatenation operators between adjacent operands.
fn insert_concat(atoms: &[Atom]) -> Vec<Atom> {
    let mut out = Vec::with_capacity(atoms.len() * 2);
    for (k, &a) in atoms.iter().enumerate() {
        out.push(a);
        let Some(&next) = atoms.get(k + 1) else {
            continue;
        };
        let ends_operand = matches!(
            a,
            Atom::Lit(_) | Atom::RParen | Atom::Star | Atom::Plus | Atom::Opt
        );
        let starts_operand = matches!(next, Atom::Lit(_) | Atom::LParen);
        if ends_operand && starts_operand {
            out.push(Atom::Concat);
        }
    }
    out
}

fn precedence(op: Atom) -> u8 {
    match op {
        Atom::Union => 1,
        Atom::Concat => 2,
        Atom::Star | Atom::Plus | Atom::Opt => 3,
        _ => 0,
    }
}

/// Converts the expanded pattern to postfix with a shunting-yard pass.
/// Precedence: `|` < concatenation < `* + ?`.
pub fn to_postfix(pattern: &str, rule: &str) -> Result<Vec<Atom>> {
    let atoms = insert_concat(&preprocess(pattern, rule)?);

    let mut postfix = Vec::with_capacity(atoms.len());
    let mut ops: Vec<Atom> = Vec::new();

    for a in atoms {
        match a {
            Atom::Lit(_) => postfix.push(a),
            Atom::LParen => ops.push(a),
            Atom::RParen => {
                loop {
                    match ops.pop() {
                        Some(Atom::LParen) => break,
                        Some(op) => postfix.push(op),
                        None => return Err(err(rule, "unmatched `)`")),
                    }
                }
            }
            op => {
                while let Some(&top) = ops.last() {
                    if top == Atom::LParen || precedence(top) < precedence(op) {
                        break;
                    }
                    postfix.push(ops.pop().unwrap());
                }
                ops.push(op);
            }
        }
    }
    while let Some(op) = ops.pop() {
        if op == Atom::LParen {
            return Err(err(rule, "unclosed `(`"));
        }
        postfix.push(op);
    }

    if postfix.is_empty() {
        return Err(err(rule, "empty pattern"));
    }
    Ok(postfix)
}
