//! Lexer and canonical-LR(1) parser-pair generator.
//!
//! `lexlr` consumes a combined lexical+grammar specification
//! (`<lexical-section> %% <grammar-section>`) and emits a standalone
//! lexer/parser pair in C++: the lexer drives a minimized DFA built by
//! Thompson construction and the subset construction, the parser drives a
//! canonical LR(1) ACTION/GOTO table with the user's semantic actions
//! (`$$`, `$i`) spliced into each reduction.
//!
//! The pipeline is strictly sequential:
//! [`spec`] reads the file, [`lex`] builds the DFA, [`clr`] builds the
//! parse tables, [`emit`] renders the runtime templates, and [`driver`]
//! wires the phases together for the CLI.

pub mod clr;
pub mod driver;
pub mod emit;
pub mod error;
pub mod lex;
pub mod report;
pub mod spec;
pub mod symtab;

pub use error::{GenError, Result};
