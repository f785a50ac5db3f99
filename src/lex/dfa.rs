//! Subset construction and DFA minimization.
//!
//! DFA states are ε-closed subsets of NFA states, deduplicated by exact
//! value equality: the subset map is an insertion-ordered `IndexMap`, so the
//! start closure receives id 0 and every new subset gets the next dense id.
//! Minimization is a partition refinement that never merges states carrying
//! different token names and renumbers so the start block is state 0 again.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use log::debug;

use crate::lex::nfa::{Nfa, StateId};

/// One row of the transition table; `state` equals the row's index and row 0
/// is the start state. An accepting row carries the name of the
/// earliest-declared rule it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaRow {
    pub state: usize,
    pub trans: BTreeMap<char, usize>,
    pub token: Option<String>,
}

impl DfaRow {
    pub fn is_final(&self) -> bool {
        self.token.is_some()
    }
}

pub type DfaTable = Vec<DfaRow>;

/// NFA to DFA via the subset construction. `rule_names[i]` is the token name
/// of rule `i`; a subset containing several accept states takes the name of
/// the lowest rule index (declaration order wins the tie).
pub fn subset_construction(nfa: &Nfa, start: StateId, rule_names: &[String]) -> DfaTable {
    let alphabet = nfa.alphabet();

    let mut subsets: IndexMap<BTreeSet<StateId>, usize> = IndexMap::new();
    let mut rows: Vec<DfaRow> = Vec::new();

    let start_closure = nfa.eps_closure(&BTreeSet::from([start]));
    subsets.insert(start_closure.clone(), 0);
    rows.push(DfaRow {
        state: 0,
        trans: BTreeMap::new(),
        token: nfa.accept_of(&start_closure).map(|r| rule_names[r].clone()),
    });

    let mut i = 0;
    while i < subsets.len() {
        let (subset, _) = subsets.get_index(i).expect("pending subset");
        let subset = subset.clone();

        for &c in &alphabet {
            let moved = nfa.move_on(&subset, c);
            if moved.is_empty() {
                continue;
            }
            let target = nfa.eps_closure(&moved);

            let id = match subsets.get(&target) {
                Some(&id) => id,
                None => {
                    let id = subsets.len();
                    rows.push(DfaRow {
                        state: id,
                        trans: BTreeMap::new(),
                        token: nfa.accept_of(&target).map(|r| rule_names[r].clone()),
                    });
                    subsets.insert(target, id);
                    id
                }
            };
            rows[i].trans.insert(c, id);
        }
        i += 1;
    }

    debug!("subset construction produced {} DFA states", rows.len());
    rows
}

/// Partition-refinement minimization preserving token names.
///
/// Initial partition: one block per distinct token name among accepting
/// states, plus one block of all non-accepting states. A block is split when
/// two of its states disagree on the target block for some input character.
pub fn minimize(table: &DfaTable) -> DfaTable {
    if table.is_empty() {
        return Vec::new();
    }

    let alphabet: BTreeSet<char> = table
        .iter()
        .flat_map(|row| row.trans.keys().copied())
        .collect();

    // token name -> initial block id; None keys the non-accepting block
    let mut block_keys: IndexMap<Option<&str>, usize> = IndexMap::new();
    let mut block_of: Vec<usize> = vec![0; table.len()];
    for row in table {
        let next = block_keys.len();
        let block = *block_keys.entry(row.token.as_deref()).or_insert(next);
        block_of[row.state] = block;
    }
    let mut blocks: Vec<Vec<usize>> = vec![Vec::new(); block_keys.len()];
    for row in table {
        blocks[block_of[row.state]].push(row.state);
    }

    // refine until no block splits
    loop {
        let mut next_blocks: Vec<Vec<usize>> = Vec::with_capacity(blocks.len());
        for block in &blocks {
            if block.len() <= 1 {
                next_blocks.push(block.clone());
                continue;
            }
            let mut groups: BTreeMap<Vec<Option<usize>>, Vec<usize>> = BTreeMap::new();
            for &state in block {
                let signature: Vec<Option<usize>> = alphabet
                    .iter()
                    .map(|c| table[state].trans.get(c).map(|&t| block_of[t]))
                    .collect();
                groups.entry(signature).or_default().push(state);
            }
            next_blocks.extend(groups.into_values());
        }

        let stable = next_blocks.len() == blocks.len();
        blocks = next_blocks;
        for (b, block) in blocks.iter().enumerate() {
            for &state in block {
                block_of[state] = b;
            }
        }
        if stable {
            break;
        }
    }

    // renumber: the block holding the old start state becomes state 0,
    // the rest get dense ids in first-seen order
    let start_block = block_of[0];
    let mut order: Vec<usize> = Vec::with_capacity(blocks.len());
    order.push(start_block);
    order.extend((0..blocks.len()).filter(|&b| b != start_block));
    let mut new_id = vec![0usize; blocks.len()];
    for (id, &b) in order.iter().enumerate() {
        new_id[b] = id;
    }

    let mut out: DfaTable = Vec::with_capacity(blocks.len());
    for &b in &order {
        let rep = blocks[b][0];
        out.push(DfaRow {
            state: new_id[b],
            trans: table[rep]
                .trans
                .iter()
                .map(|(&c, &t)| (c, new_id[block_of[t]]))
                .collect(),
            token: table[rep].token.clone(),
        });
    }

    debug!("minimization kept {} of {} states", out.len(), table.len());
    out
}
