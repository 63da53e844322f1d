//! Error types of the compile pipeline.

use thiserror::Error;

use crate::validation::consistency::ValidationResult;

/// Errors that abort a compile.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The stoichiometric matrix does not match the species or reactions
    #[error("Stoichiometric matrix mismatch: expected {expected} {axis}, found {found}")]
    StructuralMismatch {
        axis: &'static str,
        expected: usize,
        found: usize,
    },

    /// The definition failed consistency validation
    #[error("Model definition is not consistent: {0:?}")]
    Inconsistent(Vec<ValidationResult>),

    /// An id is missing from a lookup that is required during emission
    #[error("Unresolved reference '{id}' in {mapping}")]
    UnresolvedReference { id: String, mapping: String },

    /// An expression could not be parsed or rendered in the target dialect
    #[error("Unsupported expression '{expression}': {reason}")]
    UnsupportedExpression { expression: String, reason: String },

    /// Writing generated output or cleaning up failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
