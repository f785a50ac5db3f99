//! Interned grammar representation and FIRST sets.
//!
//! Symbols are dense ids laid out nonterminals-first: ids below `n_nonterm`
//! are nonterminals, the rest are terminals, and the end marker `#` is the
//! last terminal. Productions are encoded as id vectors with the left-hand
//! side at index 0, so a dot position ranges over `1..len`.

use std::collections::BTreeSet;

use crate::spec::Production;
use crate::symtab::Symtab;

/// Synthetic start symbol added by augmentation.
pub const AUGMENT_SYMBOL: &str = "S'";
/// Synthetic terminal signaling end of input.
pub const END_MARKER: &str = "#";

#[derive(Debug)]
pub struct Grammar {
    pub symbols: Symtab,
    pub n_nonterm: usize,
    pub n_term: usize,
    /// `[lhs, rhs…]` per production; index 0 is the augmented `S' -> S`.
    pub prods: Vec<Vec<usize>>,
    end_marker: usize,
}

impl Grammar {
    /// Interns and augments `productions`. Nonterminals are the lhs symbols;
    /// every rhs symbol that is nobody's lhs becomes a terminal; `#` is
    /// appended as the last terminal. The ε sentinel never reaches this
    /// point (the spec reader already strips it).
    pub fn build(productions: &[Production], start: &str) -> Self {
        let mut symbols = Symtab::new();
        symbols.add(AUGMENT_SYMBOL);
        for p in productions {
            symbols.add(&p.lhs);
        }
        let n_nonterm = symbols.len();

        for p in productions {
            for sym in &p.rhs {
                // re-adding an lhs symbol is a no-op, so only genuinely
                // undefined symbols land in the terminal range
                symbols.add(sym);
            }
        }
        let end_marker = symbols.add(END_MARKER);
        let n_term = symbols.len() - n_nonterm;

        let start_id = symbols.idx(start).expect("start symbol is a lhs");
        let mut prods = Vec::with_capacity(productions.len() + 1);
        prods.push(vec![0, start_id]);
        for p in productions {
            let mut enc = Vec::with_capacity(p.rhs.len() + 1);
            enc.push(symbols.idx(&p.lhs).expect("lhs interned"));
            for sym in &p.rhs {
                enc.push(symbols.idx(sym).expect("rhs interned"));
            }
            prods.push(enc);
        }

        Grammar {
            symbols,
            n_nonterm,
            n_term,
            prods,
            end_marker,
        }
    }

    pub fn n_syms(&self) -> usize {
        self.n_nonterm + self.n_term
    }

    pub fn is_nonterm(&self, sym: usize) -> bool {
        sym < self.n_nonterm
    }

    pub fn end_marker(&self) -> usize {
        self.end_marker
    }

    pub fn name(&self, sym: usize) -> &str {
        self.symbols.sym(sym).expect("symbol id in range")
    }
}

/// FIRST sets and nullability for every grammar symbol, computed by
/// fixpoint. ε membership is tracked by the `nullable` flags rather than a
/// sentinel symbol id.
#[derive(Debug)]
pub struct FirstSets {
    first: Vec<BTreeSet<usize>>,
    nullable: Vec<bool>,
}

impl FirstSets {
    pub fn build(g: &Grammar) -> Self {
        let n_sym = g.n_syms();
        let mut sets = FirstSets {
            first: vec![BTreeSet::new(); n_sym],
            nullable: vec![false; n_sym],
        };
        // FIRST(t) = {t} for every terminal
        for t in g.n_nonterm..n_sym {
            sets.first[t].insert(t);
        }
        while sets.pass(g) {}
        sets
    }

    /// One fixpoint iteration; returns whether anything changed.
    fn pass(&mut self, g: &Grammar) -> bool {
        let mut changed = false;
        for prod in &g.prods {
            let lhs = prod[0];
            let mut all_nullable = true;
            for &sym in &prod[1..] {
                let first_sym = self.first[sym].clone();
                for f in first_sym {
                    changed |= self.first[lhs].insert(f);
                }
                if !self.nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !self.nullable[lhs] {
                self.nullable[lhs] = true;
                changed = true;
            }
        }
        changed
    }

    pub fn first(&self, sym: usize) -> &BTreeSet<usize> {
        &self.first[sym]
    }

    pub fn nullable(&self, sym: usize) -> bool {
        self.nullable[sym]
    }

    /// `FIRST(seq a)`: walk `seq` through nullable symbols; if the whole
    /// sequence can vanish, the lookahead `a` contributes itself.
    pub fn of_seq(&self, seq: &[usize], la: usize) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for &sym in seq {
            out.extend(self.first[sym].iter().copied());
            if !self.nullable[sym] {
                return out;
            }
        }
        out.insert(la);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prod(id: usize, lhs: &str, rhs: &[&str]) -> Production {
        Production {
            id,
            lhs: lhs.to_owned(),
            rhs: rhs.iter().map(|s| s.to_string()).collect(),
            action: String::new(),
        }
    }

    fn sample() -> Grammar {
        // A : B a ;  B : b ;  B : (eps)
        let prods = vec![
            prod(0, "A", &["B", "a"]),
            prod(1, "B", &["b"]),
            prod(2, "B", &[]),
        ];
        Grammar::build(&prods, "A")
    }

    #[test]
    fn symbol_partition() {
        let g = sample();
        assert_eq!(g.n_nonterm, 3); // S', A, B
        assert_eq!(g.n_term, 3); // a, b, #
        assert!(g.is_nonterm(g.symbols.idx("A").unwrap()));
        assert!(g.is_nonterm(g.symbols.idx("B").unwrap()));
        assert!(!g.is_nonterm(g.symbols.idx("a").unwrap()));
        assert_eq!(g.name(g.end_marker()), END_MARKER);
    }

    #[test]
    fn augmentation_prepends_production_zero() {
        let g = sample();
        assert_eq!(g.prods.len(), 4);
        assert_eq!(g.prods[0], vec![0, g.symbols.idx("A").unwrap()]);
        // ε-production encodes as lhs alone
        assert_eq!(g.prods[3], vec![g.symbols.idx("B").unwrap()]);
    }

    #[test]
    fn first_sets_with_epsilon_production() {
        let g = sample();
        let first = FirstSets::build(&g);
        let a_sym = g.symbols.idx("A").unwrap();
        let b_sym = g.symbols.idx("B").unwrap();
        let t_a = g.symbols.idx("a").unwrap();
        let t_b = g.symbols.idx("b").unwrap();

        // FIRST(B) contains b and ε
        assert!(first.first(b_sym).contains(&t_b));
        assert!(first.nullable(b_sym));

        // FIRST(A) contains both b and a (B may vanish)
        assert!(first.first(a_sym).contains(&t_b));
        assert!(first.first(a_sym).contains(&t_a));
        assert!(!first.nullable(a_sym));
    }

    #[test]
    fn first_fixpoint_is_stable() {
        let g = sample();
        let mut first = FirstSets::build(&g);
        assert!(!first.pass(&g), "FIRST changed after convergence");
    }

    #[test]
    fn first_of_sequence_walks_nullables() {
        let g = sample();
        let first = FirstSets::build(&g);
        let b_sym = g.symbols.idx("B").unwrap();
        let t_a = g.symbols.idx("a").unwrap();
        let t_b = g.symbols.idx("b").unwrap();
        let end = g.end_marker();

        // FIRST(B #) = {b, #} since B is nullable
        let set = first.of_seq(&[b_sym], end);
        assert!(set.contains(&t_b));
        assert!(set.contains(&end));

        // FIRST(a #) = {a}
        let set = first.of_seq(&[t_a], end);
        assert_eq!(set, BTreeSet::from([t_a]));

        // FIRST(<empty> #) = {#}
        let set = first.of_seq(&[], end);
        assert_eq!(set, BTreeSet::from([end]));
    }

    #[test]
    fn undefined_rhs_symbols_become_terminals() {
        let prods = vec![prod(0, "S", &["S", "x"]), prod(1, "S", &["x"])];
        let g = Grammar::build(&prods, "S");
        assert_eq!(g.n_nonterm, 2); // S', S
        let x = g.symbols.idx("x").unwrap();
        assert!(!g.is_nonterm(x));
    }
}
