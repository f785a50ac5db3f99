//! Pipeline orchestration: read spec -> build lexer -> build parser -> emit.
//!
//! Strictly sequential and fail-fast; the first phase error aborts the run
//! before any later phase starts. Progress goes to stdout, conflict
//! diagnostics to stderr, per the CLI contract.

use std::path::Path;

use crate::clr::{Conflict, ParserBuilder};
use crate::emit::Emitter;
use crate::error::Result;
use crate::lex::LexerBuilder;
use crate::{report, spec};

/// What a successful run produced, for reporting.
#[derive(Debug)]
pub struct Summary {
    pub token_rules: usize,
    pub productions: usize,
    pub dfa_states: usize,
    pub lr_states: usize,
    pub conflicts: Vec<Conflict>,
}

pub fn generate(
    spec_path: &Path,
    out_dir: &Path,
    allow_conflicts: bool,
    write_report: bool,
) -> Result<Summary> {
    println!("[1/4] parsing rule file {}", spec_path.display());
    let spec = spec::read_spec(spec_path)?;
    println!(
        "   -> {} lexical rules, {} grammar productions",
        spec.tokens.len(),
        spec.productions.len()
    );

    println!("[2/4] building lexer (regex -> NFA -> DFA)");
    let mut lexer = LexerBuilder::new();
    for rule in &spec.tokens {
        lexer.add_rule(&rule.name, &rule.pattern);
    }
    let dfa = lexer.build()?;
    println!("   -> minimized DFA has {} states", dfa.len());

    println!("[3/4] building parser (LR(1) table construction)");
    let mut parser = ParserBuilder::new();
    parser.set_start_symbol(spec.start_symbol());
    parser.allow_conflicts(allow_conflicts);
    for p in &spec.productions {
        parser.add_production(&p.lhs, p.rhs.clone(), &p.action);
    }
    let tables = parser.build()?;
    println!("   -> {} LR states", tables.n_states);
    for conflict in &tables.conflicts {
        eprintln!("conflict: {}", conflict);
    }

    println!("[4/4] emitting lexer/parser sources to {}", out_dir.display());
    let emitter = Emitter::new(out_dir);
    emitter.emit_lexer(&dfa)?;
    emitter.emit_parser(&tables)?;
    println!("   -> lexer.cpp lexer.h parser.cpp parser.h");

    if write_report {
        let mut buf = Vec::new();
        report::write_report(&mut buf, &dfa, &tables)?;
        std::fs::write(out_dir.join("report.txt"), buf)?;
        println!("   -> report.txt");
    }

    Ok(Summary {
        token_rules: spec.tokens.len(),
        productions: spec.productions.len(),
        dfa_states: dfa.len(),
        lr_states: tables.n_states,
        conflicts: tables.conflicts,
    })
}
