//! Lexer construction: token rules in, minimized DFA table out.
//!
//! `LexerBuilder` runs the full chain for each declared rule — preprocess,
//! postfix conversion, Thompson construction — then merges the per-rule
//! automata under one start state, determinizes with the subset construction
//! and minimizes the result. Rule declaration order is match priority: when
//! two rules accept the same longest prefix, the earlier one names the token.

pub mod dfa;
pub mod nfa;
pub mod regex;

use log::debug;

use crate::error::Result;
use crate::spec::TokenRule;

pub use dfa::{DfaRow, DfaTable};

/// Token-rule name the generated lexer consumes silently.
pub const SKIP_TOKEN: &str = "SKIP";

/// Builds one DFA from an ordered list of token rules. Rules are added
/// before `build`; afterwards the table is read-only. All NFA state ids are
/// private to one `build` call, so several builders can run in sequence
/// without interfering.
#[derive(Debug, Default)]
pub struct LexerBuilder {
    rules: Vec<TokenRule>,
}

impl LexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, name: &str, pattern: &str) {
        debug!("lexer rule {} -> {}", name, pattern);
        self.rules.push(TokenRule {
            name: name.to_owned(),
            pattern: pattern.to_owned(),
        });
    }

    pub fn rules(&self) -> &[TokenRule] {
        &self.rules
    }

    /// Regex -> NFA -> DFA -> minimized DFA.
    pub fn build(&self) -> Result<DfaTable> {
        let mut arena = nfa::Nfa::new();
        let mut starts = Vec::with_capacity(self.rules.len());

        for (idx, rule) in self.rules.iter().enumerate() {
            let postfix = regex::to_postfix(&rule.pattern, &rule.name)?;
            let frag = arena.from_postfix(&postfix, &rule.name)?;
            arena.mark_accept(frag, idx);
            starts.push(frag.start);
        }

        let start = arena.merge(&starts);
        debug!("merged NFA has {} states", arena.len());

        let names: Vec<String> = self.rules.iter().map(|r| r.name.clone()).collect();
        let table = dfa::subset_construction(&arena, start, &names);
        Ok(dfa::minimize(&table))
    }
}
