use std::fmt;

/// Target language of a generated module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Python,
    C,
}

impl Dialect {
    /// File extension of modules in this dialect.
    pub fn extension(&self) -> &'static str {
        match self {
            Dialect::Python => "py",
            Dialect::C => "c",
        }
    }

    /// Directory modules are written to unless configured otherwise.
    pub fn default_dir(&self) -> &'static str {
        match self {
            Dialect::Python => "python_models",
            Dialect::C => "c_models",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Python => write!(f, "Python"),
            Dialect::C => write!(f, "C"),
        }
    }
}

/// Non-fatal notes collected while rendering a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An optional annotation section is absent and was skipped.
    MissingAnnotation { section: &'static str },
    /// The model has no stoichiometric matrix; ODEs were emitted verbatim.
    ReactionDerivationSkipped,
    /// The target has no algebraic equations; the equations of these
    /// species were left out.
    AlgebraicEquationsSkipped { species: Vec<String> },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingAnnotation { section } => {
                write!(f, "{} is not defined in model definition! Skipping...", section)
            }
            Diagnostic::ReactionDerivationSkipped => {
                write!(f, "No reactions specified in model definition! Using ODEs instead.")
            }
            Diagnostic::AlgebraicEquationsSkipped { species } => write!(
                f,
                "Algebraic equations are not supported in C! Skipping {}.",
                species.join(", ")
            ),
        }
    }
}

/// A fully rendered module, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedModule {
    /// Sanitized model name, used as file stem.
    pub name: String,
    pub dialect: Dialect,
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedModule {
    /// File name of the module, e.g. `Toy_Model.py`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.dialect.extension())
    }
}
