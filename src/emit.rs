//! Code emission: renders the DFA and LR tables into the runtime templates.
//!
//! Each output file is rendered fully in memory and only then written, so a
//! failing render never leaves a partial file behind. The only non-trivial
//! logic is the semantic-action rewrite: `$$` and `$i` placeholders become
//! the reduce branch's local bindings, with `$i` matched as a whole digit
//! run so `$10` can never be clobbered by `$1`.

pub mod templates;

use std::fmt::Write as _;
use std::path::PathBuf;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::clr::{LrAction, ParseTables};
use crate::error::{GenError, Result};
use crate::lex::DfaTable;

/// Emits the four generated files into one output directory.
#[derive(Debug)]
pub struct Emitter {
    out_dir: PathBuf,
}

impl Emitter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Writes `lexer.h` and `lexer.cpp`.
    pub fn emit_lexer(&self, dfa: &DfaTable) -> Result<()> {
        let source = render_lexer(dfa);
        self.write_file("lexer.h", templates::LEXER_H)?;
        self.write_file("lexer.cpp", &source)
    }

    /// Writes `parser.h` and `parser.cpp`.
    pub fn emit_parser(&self, tables: &ParseTables) -> Result<()> {
        let source = render_parser(tables)?;
        self.write_file("parser.h", templates::PARSER_H)?;
        self.write_file("parser.cpp", &source)
    }

    fn write_file(&self, name: &str, content: &str) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(name);
        std::fs::write(&path, content)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

/// The lexer source with both placeholders substituted.
pub fn render_lexer(dfa: &DfaTable) -> String {
    templates::LEXER_CPP
        .replace(templates::DFA_SWITCH_CASE, &dfa_switch_text(dfa))
        .replace(templates::FINAL_STATE_JUDGEMENT, &final_state_text(dfa))
}

/// The parser source with both placeholders substituted. Fails when a
/// semantic action references a stack position outside its production.
pub fn render_parser(tables: &ParseTables) -> Result<String> {
    Ok(templates::PARSER_CPP
        .replace(templates::ACTION_TABLE_LOGIC, &action_logic_text(tables)?)
        .replace(templates::GOTO_TABLE_LOGIC, &goto_logic_text(tables)))
}

/// A character literal for the emitted `if (c == '…')` conditions.
fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_owned(),
        '\t' => "\\t".to_owned(),
        '\r' => "\\r".to_owned(),
        '\\' => "\\\\".to_owned(),
        '\'' => "\\'".to_owned(),
        _ => c.to_string(),
    }
}

/// One `case` block per DFA row, each a chain of guarded transitions.
fn dfa_switch_text(dfa: &DfaTable) -> String {
    let mut out = String::new();
    for row in dfa {
        writeln!(out, "        case {}:", row.state).unwrap();
        for (i, (&c, &target)) in row.trans.iter().enumerate() {
            let kw = if i == 0 { "if" } else { "else if" };
            writeln!(
                out,
                "            {} (c == '{}') nextState = {};",
                kw,
                escape_char(c),
                target
            )
            .unwrap();
        }
        writeln!(out, "            break;").unwrap();
    }
    out
}

/// Maps each accepting state to its token name.
fn final_state_text(dfa: &DfaTable) -> String {
    let mut out = String::new();
    for row in dfa {
        if let Some(token) = &row.token {
            writeln!(out, "    if (state == {}) return \"{}\";", row.state, token).unwrap();
        }
    }
    out
}

// `$$` or a whole `$<digits>` run.
static ACTION_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\$|[0-9]+)").unwrap());

/// Rewrites an action body: `$$` becomes the result binding `res`, `$i`
/// becomes `vi`. Every `$i` must satisfy `1 <= i <= arity`.
fn rewrite_action(action: &str, arity: usize, production: usize) -> Result<String> {
    for cap in ACTION_REF_RE.captures_iter(action) {
        let reference = &cap[1];
        if reference == "$" {
            continue;
        }
        let ok = reference
            .parse::<usize>()
            .is_ok_and(|i| i >= 1 && i <= arity);
        if !ok {
            return Err(GenError::CodegenRef {
                production,
                reference: format!("${}", reference),
                arity,
            });
        }
    }

    Ok(ACTION_REF_RE
        .replace_all(action, |caps: &Captures| {
            if &caps[1] == "$" {
                "res".to_owned()
            } else {
                format!("v{}", &caps[1])
            }
        })
        .into_owned())
}

/// The ACTION dispatch: one guarded branch per table entry, plus the
/// accept and error behaviour required of the generated parser.
fn action_logic_text(tables: &ParseTables) -> Result<String> {
    let mut out = String::new();

    for (&(state, sym), &action) in &tables.actions {
        let term = tables.name(sym);
        match action {
            LrAction::Shift(target) => {
                writeln!(out, "        if (state == {} && tok.type == \"{}\") {{", state, term)
                    .unwrap();
                writeln!(out, "            SemanticValue sv;").unwrap();
                writeln!(out, "            sv.text = tok.text;").unwrap();
                writeln!(out, "            sv.line = tok.line;").unwrap();
                writeln!(out, "            m_states.push_back({});", target).unwrap();
                writeln!(out, "            m_values.push_back(sv);").unwrap();
                writeln!(out, "            tok = m_lexer.nextToken();").unwrap();
                writeln!(out, "            continue;").unwrap();
                writeln!(out, "        }}").unwrap();
            }
            LrAction::Reduce(prod_id) => {
                let prod = &tables.productions[prod_id];
                let arity = prod.rhs.len();
                writeln!(out, "        if (state == {} && tok.type == \"{}\") {{", state, term)
                    .unwrap();
                writeln!(
                    out,
                    "            // R{}: {} -> {}",
                    prod_id,
                    prod.lhs,
                    if prod.rhs.is_empty() {
                        "<eps>".to_owned()
                    } else {
                        prod.rhs.join(" ")
                    }
                )
                .unwrap();
                for k in (1..=arity).rev() {
                    writeln!(
                        out,
                        "            SemanticValue v{} = m_values.back(); m_values.pop_back(); m_states.pop_back();",
                        k
                    )
                    .unwrap();
                }
                writeln!(out, "            SemanticValue res;").unwrap();
                if !prod.action.is_empty() {
                    let body = rewrite_action(&prod.action, arity, prod_id)?;
                    writeln!(out, "            {}", body).unwrap();
                }
                writeln!(
                    out,
                    "            int g = gotoState(m_states.back(), \"{}\");",
                    prod.lhs
                )
                .unwrap();
                writeln!(out, "            if (g < 0) return false;").unwrap();
                writeln!(out, "            m_states.push_back(g);").unwrap();
                writeln!(out, "            m_values.push_back(res);").unwrap();
                writeln!(out, "            continue;").unwrap();
                writeln!(out, "        }}").unwrap();
            }
            LrAction::Accept => {
                writeln!(out, "        if (state == {} && tok.type == \"{}\") {{", state, term)
                    .unwrap();
                writeln!(out, "            return true;").unwrap();
                writeln!(out, "        }}").unwrap();
            }
            LrAction::Error => {}
        }
    }

    Ok(out)
}

/// The flat GOTO lookup table.
fn goto_logic_text(tables: &ParseTables) -> String {
    let mut out = String::new();
    for (&(state, sym), &target) in &tables.gotos {
        writeln!(
            out,
            "    if (state == {} && lhs == \"{}\") return {};",
            state,
            tables.name(sym),
            target
        )
        .unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clr::ParserBuilder;
    use crate::lex::DfaRow;
    use std::collections::BTreeMap;

    /// Hand-built three-state DFA: start, NUM, ID.
    fn mock_dfa() -> DfaTable {
        let mut rows = Vec::new();

        let mut t0 = BTreeMap::new();
        for c in '0'..='9' {
            t0.insert(c, 1);
        }
        for c in 'a'..='z' {
            t0.insert(c, 2);
        }
        rows.push(DfaRow {
            state: 0,
            trans: t0,
            token: None,
        });

        let mut t1 = BTreeMap::new();
        for c in '0'..='9' {
            t1.insert(c, 1);
        }
        rows.push(DfaRow {
            state: 1,
            trans: t1,
            token: Some("NUM".to_owned()),
        });

        let mut t2 = BTreeMap::new();
        for c in 'a'..='z' {
            t2.insert(c, 2);
        }
        rows.push(DfaRow {
            state: 2,
            trans: t2,
            token: Some("ID".to_owned()),
        });

        rows
    }

    fn expression_tables() -> ParseTables {
        let mut b = ParserBuilder::new();
        b.add_production(
            "E",
            vec!["E".into(), "PLUS".into(), "T".into()],
            "{ res.val = $1.val + $3.val; }",
        );
        b.add_production("E", vec!["T".into()], "{ $$ = $1; }");
        b.add_production("T", vec!["NUM".into()], "{ $$.val = $1.val; }");
        b.build().unwrap()
    }

    #[test]
    fn switch_text_covers_every_state() {
        let text = dfa_switch_text(&mock_dfa());
        assert!(text.contains("case 0:"));
        assert!(text.contains("case 1:"));
        assert!(text.contains("case 2:"));
        // one guarded condition per outgoing edge
        assert!(text.contains("if (c == '0') nextState = 1;"));
        assert!(text.contains("else if (c == '9') nextState = 1;"));
        assert!(text.contains("else if (c == 'z') nextState = 2;"));
        assert_eq!(text.matches("nextState = ").count(), 10 + 26 + 10 + 26);
    }

    #[test]
    fn final_state_dispatch_names_both_tokens() {
        let text = final_state_text(&mock_dfa());
        assert!(text.contains("if (state == 1) return \"NUM\";"));
        assert!(text.contains("if (state == 2) return \"ID\";"));
        assert!(!text.contains("state == 0"));
    }

    #[test]
    fn special_characters_are_escaped() {
        let row = DfaRow {
            state: 0,
            trans: BTreeMap::from([('\n', 0), ('\t', 0), ('\'', 0), ('\\', 0)]),
            token: None,
        };
        let text = dfa_switch_text(&vec![row]);
        assert!(text.contains("c == '\\n'"));
        assert!(text.contains("c == '\\t'"));
        assert!(text.contains("c == '\\''"));
        assert!(text.contains("c == '\\\\'"));
    }

    #[test]
    fn rendered_lexer_has_no_placeholders_left() {
        let source = render_lexer(&mock_dfa());
        assert!(!source.contains("{{"));
        assert!(source.contains("case 2:"));
        assert!(source.contains("return \"ID\";"));
    }

    #[test]
    fn rewrite_substitutes_result_and_positions() {
        let body = rewrite_action("{ $$ = $1 + $3; }", 3, 1).unwrap();
        assert_eq!(body, "{ res = v1 + v3; }");
        assert!(!body.contains('$'));
    }

    #[test]
    fn rewrite_handles_two_digit_positions() {
        let action = "{ $$ = $10; $1 = $1; }";
        let body = rewrite_action(action, 10, 2).unwrap();
        assert_eq!(body, "{ res = v10; v1 = v1; }");
    }

    #[test]
    fn rewrite_rejects_out_of_range_reference() {
        let e = rewrite_action("{ $$ = $3; }", 2, 4).unwrap_err();
        match e {
            GenError::CodegenRef {
                production,
                reference,
                arity,
            } => {
                assert_eq!(production, 4);
                assert_eq!(reference, "$3");
                assert_eq!(arity, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rewrite_rejects_position_zero() {
        assert!(rewrite_action("{ $0 }", 2, 1).is_err());
    }

    #[test]
    fn rewrite_allows_result_in_nullary_action() {
        let body = rewrite_action("{ $$.code = \"\"; }", 0, 3).unwrap();
        assert_eq!(body, "{ res.code = \"\"; }");
    }

    #[test]
    fn action_logic_contains_all_three_behaviours() {
        let tables = expression_tables();
        let text = action_logic_text(&tables).unwrap();

        // shift: pushes state and the lookahead's semantic value
        assert!(text.contains("tok.type == \"NUM\""));
        assert!(text.contains("m_values.push_back(sv);"));
        assert!(text.contains("tok = m_lexer.nextToken();"));

        // reduce: pops bindings, rewrites the body, consults GOTO
        assert!(text.contains("SemanticValue v3 = m_values.back();"));
        assert!(text.contains("res.val = v1.val + v3.val;"));
        assert!(text.contains("int g = gotoState(m_states.back(), \"E\");"));

        // accept on the end marker
        assert!(text.contains("tok.type == \"#\""));
        assert!(text.contains("return true;"));

        // rewriting left no placeholder behind
        assert!(!text.contains("$$"));
        assert!(!text.contains("$1"));
    }

    #[test]
    fn goto_logic_is_a_flat_lookup() {
        let tables = expression_tables();
        let text = goto_logic_text(&tables);
        assert!(text.contains("lhs == \"E\""));
        assert!(text.contains("lhs == \"T\""));
        assert!(text.starts_with("    if (state == "));
    }

    #[test]
    fn rendered_parser_has_no_placeholders_left() {
        let source = render_parser(&expression_tables()).unwrap();
        assert!(!source.contains("{{"));
        assert!(source.contains("bool Parser::parse()"));
        assert!(source.contains("int Parser::gotoState"));
    }

    #[test]
    fn out_of_range_action_fails_the_render() {
        let mut b = ParserBuilder::new();
        b.add_production("S", vec!["a".into()], "{ $$ = $2; }");
        let tables = b.build().unwrap();
        let e = render_parser(&tables).unwrap_err();
        assert!(matches!(e, GenError::CodegenRef { .. }));
    }
}
