//! Insertion-ordered string interner.
//!
//! The grammar machinery works on integer symbol ids; `Symtab` maintains the
//! bidirectional mapping between symbol names and ids, preserving insertion
//! order. The grammar builder relies on that to lay ids out
//! nonterminals-first: it interns every lhs before any rhs symbol, so the
//! boundary between the two ranges is just the table length after the lhs
//! pass, and the end marker `#` added last is the final terminal.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A symbol table mapping strings to dense numeric ids.
#[derive(Default, Debug, Clone)]
pub struct Symtab {
    /// Name to id lookup.
    ids: HashMap<String, usize>,

    /// Names in insertion order; a symbol's id is its position here.
    names: Vec<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a symbol, returning its id. Re-adding an existing symbol
    /// returns the id it already has, so a symbol first seen as an lhs
    /// keeps its nonterminal id no matter how often it recurs on an rhs.
    pub fn add(&mut self, name: &str) -> usize {
        match self.ids.entry(name.to_owned()) {
            Entry::Occupied(hit) => *hit.get(),
            Entry::Vacant(slot) => {
                let id = self.names.len();
                self.names.push(slot.key().clone());
                slot.insert(id);
                id
            }
        }
    }

    /// Looks up the id of a symbol by name.
    pub fn idx(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Returns the name interned under `id`.
    pub fn sym(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Iterates over all interned names in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
