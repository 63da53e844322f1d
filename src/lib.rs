//! odegen
//!
//! This library compiles reaction network definitions into ODE model modules, including:
//! - Normalizing formulas and deriving file names from model names
//! - Assembling ODEs from a stoichiometric matrix and reaction rates
//! - Validating model definitions
//! - Emitting Python and C modules
//! - Translating formulas between dialects

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::compile::*;
    pub use crate::emit::*;
    pub use crate::error::CompileError;
    pub use crate::io::*;
    pub use crate::model::*;
    pub use crate::validation::consistency::{check_consistency, Report, Severity};
}

/// Reaction network definitions
pub mod model;

/// Error types of the compile pipeline
pub mod error;

/// Formula tokenizing and normalization
pub mod formula;

/// Expression trees and the C printer
pub mod expression;

/// Model name sanitizing
pub mod naming;

/// Structural fingerprints
pub mod fingerprint;

/// ODE functionality used to derive the system of ODEs from the reactions
pub mod system;

/// Stringification of formulas for generated Python modules
pub mod stringify;

/// Translators between formula dialects
pub mod dialect;

/// Validation of model definitions
pub mod validation {
    /// Main consistency interface
    pub mod consistency;
    /// Validation of direct ODEs, algebraic equations and rate laws
    mod equations;
    /// Validation of parameters
    mod parameters;
    /// Validation of reactions and matrix columns
    mod reactions;
    /// Validation of species
    mod species;
}

/// Rendering and writing of generated modules
pub mod emit {
    pub use crate::emit::module::*;
    pub use crate::emit::writer::*;

    /// C modules for CVODE drivers
    pub mod c;
    /// Generated modules and their diagnostics
    pub mod module;
    /// Python modules
    pub mod python;
    /// Writing modules to disk
    pub mod writer;
}

/// The compile pipeline
pub mod compile;

/// Cleanup of generated solver files
pub mod cleanup;

/// IO functionality
pub mod io;
