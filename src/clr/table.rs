//! Canonical LR(1) collection and ACTION/GOTO table derivation.
//!
//! Item sets are `BTreeSet`s of `(prod, dot, lookahead)` triples and the
//! canonical collection is an insertion-ordered `IndexMap` keyed by the sets
//! themselves: membership is strict value equality on item contents, and the
//! id of a set is the order it was first enqueued, so the start closure is
//! state 0. Transitions are recorded while the collection is built; the
//! ACTION and GOTO tables are read off that map, never re-matched after the
//! fact.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use log::debug;

use crate::clr::grammar::{FirstSets, Grammar};

/// An LR(1) item: production, dot position and one lookahead terminal.
/// Ordering is lexicographic on the triple. The dot ranges over `1..len` of
/// the encoded production (index 0 holds the lhs), so `dot == len` means the
/// item is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub prod: usize,
    pub dot: usize,
    pub la: usize,
}

pub type ItemSet = std::collections::BTreeSet<Item>;

/// A parse action. Absent table entries mean `Error`; the variant exists so
/// diagnostics and the emitted fallback branch can name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrAction {
    Shift(usize),
    Reduce(usize),
    Accept,
    Error,
}

impl fmt::Display for LrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LrAction::Shift(j) => write!(f, "shift {}", j),
            LrAction::Reduce(r) => write!(f, "reduce R{}", r),
            LrAction::Accept => write!(f, "accept"),
            LrAction::Error => write!(f, "error"),
        }
    }
}

/// A doubly-assigned ACTION cell. The first assignment stays in the table;
/// the later one is recorded here.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub state: usize,
    pub symbol: String,
    pub kept: LrAction,
    pub dropped: LrAction,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state {}, symbol {}: kept {}, dropped {}",
            self.state, self.symbol, self.kept, self.dropped
        )
    }
}

/// The canonical collection plus the transitions discovered while building
/// it: `trans[(state, symbol)]` is the goto target.
#[derive(Debug)]
pub struct Collection {
    pub sets: Vec<ItemSet>,
    pub trans: BTreeMap<(usize, usize), usize>,
}

/// Saturates `items`: for every `[A -> α·Bβ, a]` and every production
/// `B -> γ`, adds `[B -> ·γ, b]` for each `b ∈ FIRST(βa)`.
pub fn closure(g: &Grammar, first: &FirstSets, items: &ItemSet) -> ItemSet {
    let mut c = items.clone();
    let mut inserted = true;
    while inserted {
        inserted = false;
        for item in c.clone() {
            let prod = &g.prods[item.prod];
            if item.dot >= prod.len() {
                continue;
            }
            let b_sym = prod[item.dot];
            if !g.is_nonterm(b_sym) {
                continue;
            }
            let beta = &prod[item.dot + 1..];
            let lookaheads = first.of_seq(beta, item.la);
            for (j, p) in g.prods.iter().enumerate() {
                if p[0] != b_sym {
                    continue;
                }
                for &la in &lookaheads {
                    if c.insert(Item { prod: j, dot: 1, la }) {
                        inserted = true;
                    }
                }
            }
        }
    }
    c
}

/// Advances every item of `items` over `sym` and closes the result.
pub fn goto_set(g: &Grammar, first: &FirstSets, items: &ItemSet, sym: usize) -> ItemSet {
    let mut moved = ItemSet::new();
    for item in items {
        let prod = &g.prods[item.prod];
        if item.dot < prod.len() && prod[item.dot] == sym {
            moved.insert(Item {
                prod: item.prod,
                dot: item.dot + 1,
                la: item.la,
            });
        }
    }
    if moved.is_empty() {
        moved
    } else {
        closure(g, first, &moved)
    }
}

/// Builds the canonical collection from `closure({[S' -> ·S, #]})` by
/// worklist. New sets are appended only when value-distinct from every
/// existing set.
pub fn canonical_collection(g: &Grammar, first: &FirstSets) -> Collection {
    let start = closure(
        g,
        first,
        &ItemSet::from([Item {
            prod: 0,
            dot: 1,
            la: g.end_marker(),
        }]),
    );

    let mut sets: IndexMap<ItemSet, usize> = IndexMap::new();
    sets.insert(start, 0);
    let mut trans: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    let mut i = 0;
    while i < sets.len() {
        let (set, _) = sets.get_index(i).expect("pending item set");
        let set = set.clone();

        for sym in 0..g.n_syms() {
            let target = goto_set(g, first, &set, sym);
            if target.is_empty() {
                continue;
            }
            let j = match sets.get(&target) {
                Some(&j) => j,
                None => {
                    let j = sets.len();
                    sets.insert(target, j);
                    j
                }
            };
            trans.insert((i, sym), j);
        }
        i += 1;
    }

    debug!("canonical collection has {} item sets", sets.len());
    Collection {
        sets: sets.into_keys().collect(),
        trans,
    }
}

/// The derived parse tables. Keys are `(state, symbol-id)`; missing ACTION
/// entries are errors.
#[derive(Debug)]
pub struct Tables {
    pub actions: BTreeMap<(usize, usize), LrAction>,
    pub gotos: BTreeMap<(usize, usize), usize>,
    pub n_states: usize,
    pub conflicts: Vec<Conflict>,
}

/// Reads ACTION and GOTO off the collection. For each state: shifts from
/// the recorded terminal transitions, then reductions from complete items
/// (`Accept` for the augmented item on `#`), then gotos from the
/// nonterminal transitions. A second, different assignment to a cell keeps
/// the first action and records a [`Conflict`].
pub fn derive_tables(g: &Grammar, coll: &Collection) -> Tables {
    let mut tables = Tables {
        actions: BTreeMap::new(),
        gotos: BTreeMap::new(),
        n_states: coll.sets.len(),
        conflicts: Vec::new(),
    };

    for (i, set) in coll.sets.iter().enumerate() {
        for sym in g.n_nonterm..g.n_syms() {
            if let Some(&j) = coll.trans.get(&(i, sym)) {
                insert_action(g, &mut tables, i, sym, LrAction::Shift(j));
            }
        }

        for item in set {
            let prod = &g.prods[item.prod];
            if item.dot < prod.len() {
                continue;
            }
            if item.prod == 0 {
                // [S' -> S·, #]
                insert_action(g, &mut tables, i, g.end_marker(), LrAction::Accept);
            } else {
                insert_action(g, &mut tables, i, item.la, LrAction::Reduce(item.prod));
            }
        }

        for sym in 0..g.n_nonterm {
            if let Some(&j) = coll.trans.get(&(i, sym)) {
                tables.gotos.insert((i, sym), j);
            }
        }
    }

    debug!(
        "derived {} ACTION entries, {} GOTO entries, {} conflict(s)",
        tables.actions.len(),
        tables.gotos.len(),
        tables.conflicts.len()
    );
    tables
}

fn insert_action(g: &Grammar, tables: &mut Tables, state: usize, sym: usize, action: LrAction) {
    match tables.actions.get(&(state, sym)) {
        None => {
            tables.actions.insert((state, sym), action);
        }
        Some(&kept) if kept == action => {}
        Some(&kept) => tables.conflicts.push(Conflict {
            state,
            symbol: g.name(sym).to_owned(),
            kept,
            dropped: action,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Production;

    fn prod(id: usize, lhs: &str, rhs: &[&str]) -> Production {
        Production {
            id,
            lhs: lhs.to_owned(),
            rhs: rhs.iter().map(|s| s.to_string()).collect(),
            action: String::new(),
        }
    }

    /// E : E PLUS T | T ;  T : T MUL F | F ;  F : LPAREN E RPAREN | NUM
    fn expression_grammar() -> Grammar {
        let prods = vec![
            prod(0, "E", &["E", "PLUS", "T"]),
            prod(1, "E", &["T"]),
            prod(2, "T", &["T", "MUL", "F"]),
            prod(3, "T", &["F"]),
            prod(4, "F", &["LPAREN", "E", "RPAREN"]),
            prod(5, "F", &["NUM"]),
        ];
        Grammar::build(&prods, "E")
    }

    /// Drives the tables over a terminal-name sequence, the way the emitted
    /// parser would.
    fn simulate(g: &Grammar, t: &Tables, input: &[&str]) -> bool {
        let mut toks: Vec<usize> = input.iter().map(|s| g.symbols.idx(s).unwrap()).collect();
        toks.push(g.end_marker());

        let mut states = vec![0usize];
        let mut pos = 0;
        loop {
            let state = *states.last().unwrap();
            match t.actions.get(&(state, toks[pos])) {
                Some(&LrAction::Shift(j)) => {
                    states.push(j);
                    pos += 1;
                }
                Some(&LrAction::Reduce(r)) => {
                    for _ in 0..g.prods[r].len() - 1 {
                        states.pop();
                    }
                    let lhs = g.prods[r][0];
                    let top = *states.last().unwrap();
                    match t.gotos.get(&(top, lhs)) {
                        Some(&j) => states.push(j),
                        None => return false,
                    }
                }
                Some(&LrAction::Accept) => return true,
                _ => return false,
            }
        }
    }

    #[test]
    fn closure_is_a_fixpoint() {
        let g = expression_grammar();
        let first = FirstSets::build(&g);
        let seed = ItemSet::from([Item {
            prod: 0,
            dot: 1,
            la: g.end_marker(),
        }]);
        let once = closure(&g, &first, &seed);
        let twice = closure(&g, &first, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn closure_tracks_lookaheads_through_first() {
        let g = expression_grammar();
        let first = FirstSets::build(&g);
        let seed = ItemSet::from([Item {
            prod: 0,
            dot: 1,
            la: g.end_marker(),
        }]);
        let c = closure(&g, &first, &seed);

        // [E -> ·E PLUS T, #] spawns [E -> ·T, PLUS] via FIRST(PLUS T #)
        let plus = g.symbols.idx("PLUS").unwrap();
        assert!(c.contains(&Item {
            prod: 2,
            dot: 1,
            la: plus
        }));
        // and T productions appear with MUL lookahead via FIRST(MUL F …)
        let mul = g.symbols.idx("MUL").unwrap();
        assert!(c.contains(&Item {
            prod: 4,
            dot: 1,
            la: mul
        }));
    }

    #[test]
    fn collection_sets_are_value_distinct() {
        let g = expression_grammar();
        let first = FirstSets::build(&g);
        let coll = canonical_collection(&g, &first);
        for (i, a) in coll.sets.iter().enumerate() {
            for (j, b) in coll.sets.iter().enumerate().skip(i + 1) {
                assert!(a != b, "item sets {} and {} are equal", i, j);
            }
        }
    }

    #[test]
    fn expression_grammar_tables() {
        let g = expression_grammar();
        let first = FirstSets::build(&g);
        let coll = canonical_collection(&g, &first);
        let t = derive_tables(&g, &coll);

        assert!(t.conflicts.is_empty(), "unexpected: {:?}", t.conflicts);

        // state 0 shifts on both fronts of an expression
        let num = g.symbols.idx("NUM").unwrap();
        let lparen = g.symbols.idx("LPAREN").unwrap();
        assert!(matches!(t.actions.get(&(0, num)), Some(LrAction::Shift(_))));
        assert!(matches!(
            t.actions.get(&(0, lparen)),
            Some(LrAction::Shift(_))
        ));

        // shifts exist on every operator terminal somewhere in the table
        for term in ["PLUS", "MUL"] {
            let sym = g.symbols.idx(term).unwrap();
            assert!(t
                .actions
                .iter()
                .any(|(&(_, s), a)| s == sym && matches!(a, LrAction::Shift(_))));
        }

        // exactly one accept, and it sits on the end marker
        let accepts: Vec<_> = t
            .actions
            .iter()
            .filter(|(_, a)| matches!(a, LrAction::Accept))
            .collect();
        assert_eq!(accepts.len(), 1);
        assert_eq!(accepts[0].0 .1, g.end_marker());
    }

    #[test]
    fn expression_grammar_parses_with_precedence() {
        let g = expression_grammar();
        let first = FirstSets::build(&g);
        let t = derive_tables(&g, &canonical_collection(&g, &first));

        assert!(simulate(&g, &t, &["NUM"]));
        assert!(simulate(&g, &t, &["NUM", "PLUS", "NUM", "MUL", "NUM"]));
        assert!(simulate(
            &g,
            &t,
            &["LPAREN", "NUM", "PLUS", "NUM", "RPAREN", "MUL", "NUM"]
        ));
        assert!(!simulate(&g, &t, &["NUM", "PLUS"]));
        assert!(!simulate(&g, &t, &["NUM", "NUM"]));
        assert!(!simulate(&g, &t, &["LPAREN", "NUM"]));
    }

    #[test]
    fn ambiguous_grammar_reports_shift_reduce_conflict() {
        // S : S S | a — ambiguous, so at least one cell is assigned twice
        let prods = vec![prod(0, "S", &["S", "S"]), prod(1, "S", &["a"])];
        let g = Grammar::build(&prods, "S");
        let first = FirstSets::build(&g);
        let t = derive_tables(&g, &canonical_collection(&g, &first));

        assert!(!t.conflicts.is_empty());
        // shifts are assigned before reductions, so first-wins keeps the shift
        let c = &t.conflicts[0];
        assert!(matches!(c.kept, LrAction::Shift(_)));
        assert!(matches!(c.dropped, LrAction::Reduce(_)));

        // the table still drives parses under the first-wins policy
        assert!(simulate(&g, &t, &["a"]));
        assert!(simulate(&g, &t, &["a", "a", "a"]));
    }

    #[test]
    fn action_entries_are_justified_by_items() {
        // LR table well-formedness: every entry traces back to an item
        let g = expression_grammar();
        let first = FirstSets::build(&g);
        let coll = canonical_collection(&g, &first);
        let t = derive_tables(&g, &coll);

        for (&(state, sym), action) in &t.actions {
            let set = &coll.sets[state];
            let justified = match *action {
                LrAction::Shift(j) => {
                    coll.trans.get(&(state, sym)) == Some(&j)
                        && set.iter().any(|it| {
                            let p = &g.prods[it.prod];
                            it.dot < p.len() && p[it.dot] == sym
                        })
                }
                LrAction::Reduce(r) => set.iter().any(|it| {
                    it.prod == r && it.dot == g.prods[r].len() && it.la == sym
                }),
                LrAction::Accept => {
                    sym == g.end_marker()
                        && set.iter().any(|it| {
                            it.prod == 0 && it.dot == g.prods[0].len() && it.la == g.end_marker()
                        })
                }
                LrAction::Error => false,
            };
            assert!(justified, "entry ({state}, {}) = {action}", g.name(sym));
        }
    }

    #[test]
    fn epsilon_production_grammar_builds() {
        // A : B a ;  B : b ;  B : ε — reductions by the ε-production must
        // appear so `a` alone is a valid sentence
        let prods = vec![
            prod(0, "A", &["B", "a"]),
            prod(1, "B", &["b"]),
            prod(2, "B", &[]),
        ];
        let g = Grammar::build(&prods, "A");
        let first = FirstSets::build(&g);
        let t = derive_tables(&g, &canonical_collection(&g, &first));

        assert!(t.conflicts.is_empty());
        assert!(simulate(&g, &t, &["b", "a"]));
        assert!(simulate(&g, &t, &["a"]));
        assert!(!simulate(&g, &t, &["b"]));
    }
}
