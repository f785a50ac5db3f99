//! Thompson NFA construction.
//!
//! All states live in one arena (`Vec`) owned by the build in progress;
//! fragments are `(start, accept)` id pairs, so composing two fragments can
//! never alias states between them. Accept states record the index of the
//! token rule they belong to — declaration order doubles as match priority.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{GenError, Result};
use crate::lex::regex::Atom;

pub type StateId = usize;

#[derive(Debug, Clone, Default)]
pub struct NfaState {
    /// Labelled transitions: input character to successor set.
    pub trans: BTreeMap<char, BTreeSet<StateId>>,
    /// ε-transitions.
    pub eps: BTreeSet<StateId>,
    /// Index of the token rule this state accepts, if any.
    pub accept: Option<usize>,
}

/// A sub-automaton under construction: one entry, one exit.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub start: StateId,
    pub accept: StateId,
}

/// An NFA arena. State ids are dense indices into `states`, monotonically
/// increasing across everything built from one arena.
#[derive(Debug, Default)]
pub struct Nfa {
    states: Vec<NfaState>,
}

impl Nfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: StateId) -> &NfaState {
        &self.states[id]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn new_state(&mut self) -> StateId {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn link_eps(&mut self, from: StateId, to: StateId) {
        self.states[from].eps.insert(to);
    }

    fn link(&mut self, from: StateId, c: char, to: StateId) {
        self.states[from].trans.entry(c).or_default().insert(to);
    }

    /// `s —c→ e`
    fn lit(&mut self, c: char) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.link(start, c, accept);
        Fragment { start, accept }
    }

    /// Reuses `a.start`, links `a.accept —ε→ b.start`, takes `b.accept`.
    fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        self.link_eps(a.accept, b.start);
        Fragment {
            start: a.start,
            accept: b.accept,
        }
    }

    /// Fresh start ε-linked to both operands; both accepts ε-linked to a
    /// fresh accept.
    fn union(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.link_eps(start, a.start);
        self.link_eps(start, b.start);
        self.link_eps(a.accept, accept);
        self.link_eps(b.accept, accept);
        Fragment { start, accept }
    }

    fn star(&mut self, a: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.link_eps(start, a.start);
        self.link_eps(start, accept);
        self.link_eps(a.accept, a.start);
        self.link_eps(a.accept, accept);
        Fragment { start, accept }
    }

    /// As `star` but without the empty path from start to accept.
    fn plus(&mut self, a: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.link_eps(start, a.start);
        self.link_eps(a.accept, a.start);
        self.link_eps(a.accept, accept);
        Fragment { start, accept }
    }

    /// As `star` but without the loop back from accept to start.
    fn opt(&mut self, a: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.link_eps(start, a.start);
        self.link_eps(start, accept);
        self.link_eps(a.accept, accept);
        Fragment { start, accept }
    }

    /// Builds a fragment from a postfix atom stream. Operators consume their
    /// operand fragments from the stack by value.
    pub fn from_postfix(&mut self, postfix: &[Atom], rule: &str) -> Result<Fragment> {
        let malformed = || GenError::RegexSyntax {
            rule: rule.to_owned(),
            cause: "malformed pattern".into(),
        };

        let mut stack: Vec<Fragment> = Vec::new();
        for &atom in postfix {
            let frag = match atom {
                Atom::Lit(c) => self.lit(c),
                Atom::Concat => {
                    let b = stack.pop().ok_or_else(malformed)?;
                    let a = stack.pop().ok_or_else(malformed)?;
                    self.concat(a, b)
                }
                Atom::Union => {
                    let b = stack.pop().ok_or_else(malformed)?;
                    let a = stack.pop().ok_or_else(malformed)?;
                    self.union(a, b)
                }
                Atom::Star => {
                    let a = stack.pop().ok_or_else(malformed)?;
                    self.star(a)
                }
                Atom::Plus => {
                    let a = stack.pop().ok_or_else(malformed)?;
                    self.plus(a)
                }
                Atom::Opt => {
                    let a = stack.pop().ok_or_else(malformed)?;
                    self.opt(a)
                }
                Atom::LParen | Atom::RParen => return Err(malformed()),
            };
            stack.push(frag);
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(frag), true) => Ok(frag),
            _ => Err(malformed()),
        }
    }

    /// Marks the fragment's accept state as accepting `rule_idx`.
    pub fn mark_accept(&mut self, frag: Fragment, rule_idx: usize) {
        self.states[frag.accept].accept = Some(rule_idx);
    }

    /// Merges per-rule fragments under one fresh start with ε-transitions to
    /// every rule's entry; accept states keep their distinct rule tags.
    pub fn merge(&mut self, starts: &[StateId]) -> StateId {
        let start = self.new_state();
        for &s in starts {
            self.link_eps(start, s);
        }
        start
    }

    /// ε-closure of a state set (worklist).
    pub fn eps_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut closure = states.clone();
        let mut work: VecDeque<StateId> = states.iter().copied().collect();
        while let Some(s) = work.pop_front() {
            for &next in &self.states[s].eps {
                if closure.insert(next) {
                    work.push_back(next);
                }
            }
        }
        closure
    }

    /// States reachable from `states` by consuming `c` (no closure applied).
    pub fn move_on(&self, states: &BTreeSet<StateId>, c: char) -> BTreeSet<StateId> {
        let mut out = BTreeSet::new();
        for &s in states {
            if let Some(targets) = self.states[s].trans.get(&c) {
                out.extend(targets.iter().copied());
            }
        }
        out
    }

    /// Every character labelling a transition anywhere in the arena.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states
            .iter()
            .flat_map(|s| s.trans.keys().copied())
            .collect()
    }

    /// Highest-priority (lowest-index) rule accepted by any state in the set.
    pub fn accept_of(&self, states: &BTreeSet<StateId>) -> Option<usize> {
        states.iter().filter_map(|&s| self.states[s].accept).min()
    }
}
