//! Error taxonomy for the generator pipeline.
//!
//! Every phase fails fast with a [`GenError`] carrying enough location data
//! for a one-line diagnostic. Errors are not caught across phases; the
//! driver aborts on the first one.

use thiserror::Error;

/// All failures the generator can produce, one variant per phase.
#[derive(Debug, Error)]
pub enum GenError {
    /// The specification file violates the `<lexical> %% <grammar>` format.
    #[error("spec syntax error at line {line}: {cause}")]
    SpecSyntax { line: usize, cause: String },

    /// A token rule's pattern is not a valid regular expression.
    #[error("bad pattern for token {rule}: {cause}")]
    RegexSyntax { rule: String, cause: String },

    /// The grammar is not LR(1); at least one ACTION cell was assigned twice.
    #[error("grammar is not LR(1): {count} conflict(s), first: {first}")]
    GrammarConflict { count: usize, first: String },

    /// A semantic action references a stack position outside `[1..|rhs|]`.
    #[error("semantic action of production {production} references {reference}, but the rhs has {arity} symbol(s)")]
    CodegenRef {
        production: usize,
        reference: String,
        arity: usize,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;
