//! Human-readable dumps of the generated automata and tables.
//!
//! Everything here writes to an `io::Write`, so the driver can aim it at a
//! report file and tests can aim it at a buffer. The formats are meant for
//! eyeballing a build: DFA rows with their transitions, productions,
//! item sets with dot markers, and the two parse tables.

use std::io::{self, Write};

use crate::clr::{LrAction, ParseTables};
use crate::lex::DfaTable;

/// One line per DFA state: final marker, token name, transitions.
pub fn write_dfa<W: Write>(out: &mut W, dfa: &DfaTable) -> io::Result<()> {
    writeln!(out, "========== DFA ({} states) ==========", dfa.len())?;
    for row in dfa {
        match &row.token {
            Some(token) => write!(out, "state {:>3} [{}]:", row.state, token)?,
            None => write!(out, "state {:>3}:", row.state)?,
        }
        for (&c, &target) in &row.trans {
            write!(out, " {:?}->{}", c, target)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// Productions in `R<id>: lhs -> rhs` form, ε shown explicitly.
pub fn write_prods<W: Write>(out: &mut W, tables: &ParseTables) -> io::Result<()> {
    writeln!(
        out,
        "========== Productions ({}) ==========",
        tables.productions.len()
    )?;
    for p in &tables.productions {
        write!(out, "R{}: {} ->", p.id, p.lhs)?;
        if p.rhs.is_empty() {
            write!(out, " <eps>")?;
        }
        for sym in &p.rhs {
            write!(out, " {}", sym)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// The canonical collection, one item per line with a `.` dot marker and
/// the lookahead in brackets.
pub fn write_item_sets<W: Write>(out: &mut W, tables: &ParseTables) -> io::Result<()> {
    writeln!(
        out,
        "========== Item sets ({}) ==========",
        tables.item_sets.len()
    )?;
    for (i, set) in tables.item_sets.iter().enumerate() {
        writeln!(out, "I{}:", i)?;
        for item in set {
            let prod = &tables.grammar.prods[item.prod];
            write!(out, "  [{} ->", tables.name(prod[0]))?;
            for (k, &sym) in prod[1..].iter().enumerate() {
                if k + 1 == item.dot {
                    write!(out, " .")?;
                }
                write!(out, " {}", tables.name(sym))?;
            }
            if item.dot == prod.len() {
                write!(out, " .")?;
            }
            writeln!(out, ", {}]", tables.name(item.la))?;
        }
    }
    writeln!(out)
}

/// ACTION table in the `state  symbol  action` layout.
pub fn write_action_table<W: Write>(out: &mut W, tables: &ParseTables) -> io::Result<()> {
    writeln!(out, "========== ACTION table ==========")?;
    writeln!(out, "state\tsymbol\taction")?;
    for (&(state, sym), &action) in &tables.actions {
        let action = match action {
            LrAction::Shift(j) => format!("shift {}", j),
            LrAction::Reduce(r) => format!("reduce R{}", r),
            LrAction::Accept => "accept".to_owned(),
            LrAction::Error => "error".to_owned(),
        };
        writeln!(out, "{}\t{}\t{}", state, tables.name(sym), action)?;
    }
    writeln!(out)
}

/// GOTO table in the `state  nonterminal  target` layout.
pub fn write_goto_table<W: Write>(out: &mut W, tables: &ParseTables) -> io::Result<()> {
    writeln!(out, "========== GOTO table ==========")?;
    writeln!(out, "state\tnonterminal\tgoto")?;
    for (&(state, sym), &target) in &tables.gotos {
        writeln!(out, "{}\t{}\t{}", state, tables.name(sym), target)?;
    }
    writeln!(out)
}

/// The whole build report: DFA, productions, item sets, both tables and
/// any recorded conflicts.
pub fn write_report<W: Write>(out: &mut W, dfa: &DfaTable, tables: &ParseTables) -> io::Result<()> {
    write_dfa(out, dfa)?;
    write_prods(out, tables)?;
    write_item_sets(out, tables)?;
    write_action_table(out, tables)?;
    write_goto_table(out, tables)?;
    if !tables.conflicts.is_empty() {
        writeln!(out, "========== Conflicts ({}) ==========", tables.conflicts.len())?;
        for c in &tables.conflicts {
            writeln!(out, "{}", c)?;
        }
    }
    Ok(())
}
