//! Parser construction: grammar productions in, canonical LR(1) tables out.
//!
//! `ParserBuilder` collects productions additively, augments the grammar
//! with `S' -> S`, computes FIRST sets, builds the canonical LR(1)
//! collection and derives the ACTION/GOTO tables. Conflicting table cells
//! keep their first assignment; whether the recorded conflicts abort the
//! build is the caller's choice (`allow_conflicts`).

pub mod grammar;
pub mod table;

use std::collections::BTreeMap;

use log::debug;

use crate::error::{GenError, Result};
use crate::spec::Production;

pub use grammar::{FirstSets, Grammar, AUGMENT_SYMBOL, END_MARKER};
pub use table::{Conflict, LrAction};

/// Everything the emitter needs: the interned grammar, the augmented
/// production list (ids renumbered so the reduce ids in `actions` index it
/// directly), and the two dispatch tables.
#[derive(Debug)]
pub struct ParseTables {
    pub grammar: Grammar,
    /// `productions[0]` is the synthetic `S' -> S`; user productions follow
    /// with ids `1..=n`.
    pub productions: Vec<Production>,
    pub actions: BTreeMap<(usize, usize), LrAction>,
    pub gotos: BTreeMap<(usize, usize), usize>,
    /// The canonical collection the tables were derived from, kept for
    /// reporting; `item_sets[i]` is state `i`.
    pub item_sets: Vec<table::ItemSet>,
    pub n_states: usize,
    pub conflicts: Vec<Conflict>,
}

impl ParseTables {
    pub fn name(&self, sym: usize) -> &str {
        self.grammar.name(sym)
    }

    pub fn end_marker(&self) -> usize {
        self.grammar.end_marker()
    }
}

#[derive(Debug, Default)]
pub struct ParserBuilder {
    productions: Vec<Production>,
    start: Option<String>,
    allow_conflicts: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the start symbol; by default it is the lhs of the first
    /// production added.
    pub fn set_start_symbol(&mut self, sym: &str) {
        debug!("start symbol set to {}", sym);
        self.start = Some(sym.to_owned());
    }

    /// Keep going when the grammar has conflicts (first action wins).
    pub fn allow_conflicts(&mut self, allow: bool) {
        self.allow_conflicts = allow;
    }

    pub fn add_production(&mut self, lhs: &str, rhs: Vec<String>, action: &str) {
        let id = self.productions.len();
        debug!("production R{}: {} -> {:?}", id, lhs, rhs);
        self.productions.push(Production {
            id,
            lhs: lhs.to_owned(),
            rhs,
            action: action.to_owned(),
        });
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Augment, compute FIRST, build the canonical collection, derive the
    /// tables. Fails with `GrammarConflict` when the grammar is not LR(1)
    /// and conflicts were not explicitly allowed.
    pub fn build(&self) -> Result<ParseTables> {
        let Some(start) = self
            .start
            .clone()
            .or_else(|| self.productions.first().map(|p| p.lhs.clone()))
        else {
            return Err(GenError::SpecSyntax {
                line: 0,
                cause: "grammar has no productions".into(),
            });
        };
        if !self.productions.iter().any(|p| p.lhs == start) {
            return Err(GenError::SpecSyntax {
                line: 0,
                cause: format!("start symbol {} has no production", start),
            });
        }

        let g = Grammar::build(&self.productions, &start);
        let first = FirstSets::build(&g);
        let coll = table::canonical_collection(&g, &first);
        let tables = table::derive_tables(&g, &coll);

        if !tables.conflicts.is_empty() && !self.allow_conflicts {
            return Err(GenError::GrammarConflict {
                count: tables.conflicts.len(),
                first: tables.conflicts[0].to_string(),
            });
        }

        // renumber the user's productions behind the augmented S' -> S so
        // reduce ids index the list directly
        let mut productions = Vec::with_capacity(self.productions.len() + 1);
        productions.push(Production {
            id: 0,
            lhs: AUGMENT_SYMBOL.to_owned(),
            rhs: vec![start],
            action: String::new(),
        });
        for (k, p) in self.productions.iter().enumerate() {
            productions.push(Production {
                id: k + 1,
                lhs: p.lhs.clone(),
                rhs: p.rhs.clone(),
                action: p.action.clone(),
            });
        }

        Ok(ParseTables {
            grammar: g,
            productions,
            actions: tables.actions,
            gotos: tables.gotos,
            item_sets: coll.sets,
            n_states: tables.n_states,
            conflicts: tables.conflicts,
        })
    }
}
