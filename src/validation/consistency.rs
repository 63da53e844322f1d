//! Consistency module for checking model definitions.
//!
//! This module provides functionality to validate reaction network definitions
//! by checking:
//! - Uniqueness of species and parameter identifiers
//! - Reaction ids and the species they reference
//! - Columns of the stoichiometric matrix
//! - Species and symbols referenced by ODEs, algebraic equations and rates
//!
//! The main entry point is the `check_consistency` function which runs all validation
//! checks and returns a `Report` with the results.

use std::collections::HashSet;
use std::fmt;

use crate::model::ModelDefinition;
use crate::validation::equations::check_equations;
use crate::validation::parameters::check_parameters;
use crate::validation::reactions::check_reactions;
use crate::validation::species::check_species;

use colored::Colorize;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern");
}

/// Symbols that may appear in formulas without being declared.
pub(crate) const BUILTIN_SYMBOLS: [&str; 4] = ["t", "time", "pi", "e"];

/// The `check_consistency` function is used to check the consistency of a `ModelDefinition`.
/// It returns a `Report` containing the results of the checks.
///
/// # Arguments
///
/// * `model` - A reference to the `ModelDefinition` to be checked.
///
/// # Returns
///
/// Returns a `Report` containing the results of the consistency checks.
pub fn check_consistency(model: &ModelDefinition) -> Report {
    let mut report = Report::new();

    check_species(model, &mut report);
    check_parameters(model, &mut report);
    check_reactions(model, &mut report);
    check_equations(model, &mut report);

    report
}

/// The `Report` struct is used to store the results of the validation checks.
///
/// Contains a boolean indicating overall validity and a vector of individual validation results.
/// The definition is considered invalid if any validation results have Error severity.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct Report {
    /// Whether the definition is valid overall. False if any errors were found.
    pub is_valid: bool,
    /// Vector of individual validation results found during checks.
    pub errors: Vec<ValidationResult>,
}

impl Report {
    /// Creates a new, valid `Report` without results.
    pub(crate) fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Adds a validation result to the report.
    ///
    /// If the result has Error severity, marks the overall report as invalid.
    pub fn add_result(&mut self, result: ValidationResult) {
        if result.severity == Severity::Error {
            self.is_valid = false;
        }
        self.errors.push(result);
    }

    /// Filters the results by the identifier.
    pub fn filter_results(&self, identifier: &str) -> Vec<ValidationResult> {
        self.errors
            .iter()
            .filter(|result| result.identifier.as_deref() == Some(identifier))
            .cloned()
            .collect()
    }

    /// Results with the given severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<&ValidationResult> {
        self.errors
            .iter()
            .filter(|result| result.severity == severity)
            .collect()
    }
}

/// The `ValidationResult` struct represents a single validation issue found during checking.
///
/// Contains the location where the issue was found, a descriptive message, and the severity level.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationResult {
    /// JSON pointer path to the location of the validation issue
    location: String,
    /// Human readable description of the validation issue
    message: String,
    /// Severity level of the validation issue
    severity: Severity,
    /// The identifier of the object, if any
    identifier: Option<String>,
}

impl ValidationResult {
    /// Creates a new `ValidationResult`.
    ///
    /// # Arguments
    ///
    /// * `location` - The location of the validation issue as a JSON pointer path.
    /// * `message` - A message describing the validation issue.
    /// * `severity` - The severity of the validation issue.
    /// * `identifier` - The id of the offending object, if any.
    pub fn new(
        location: String,
        message: String,
        severity: Severity,
        identifier: Option<String>,
    ) -> Self {
        Self {
            location,
            message,
            severity,
            identifier,
        }
    }

    /// JSON pointer path to the validation issue.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Human readable message describing the issue.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    pub fn identifier(&self) -> &Option<String> {
        &self.identifier
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.severity {
            Severity::Error => self.message.bold().red(),
            Severity::Warning => self.message.bold().yellow(),
            Severity::Info => self.message.bold().green(),
        };

        let severity = match self.severity {
            Severity::Error => "Error".bold().red(),
            Severity::Warning => "Warning".bold().yellow(),
            Severity::Info => "Info".bold().green(),
        };

        write!(
            f,
            "[{}] {}:\n\t└── {}",
            self.location.bold(),
            severity,
            message
        )
    }
}

/// Severity levels for validation issues.
///
/// Used to indicate how serious a validation issue is:
/// - Error: The definition cannot be compiled
/// - Warning: The definition may have issues but can still be compiled
/// - Info: Informational message about potential improvements
#[derive(Debug, Clone, PartialEq, Copy, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    /// Critical issue that makes the definition invalid
    Error,
    /// Non-critical issue that should be reviewed
    Warning,
    /// Informational message about potential improvements
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

/// Reports every identifier that occurs more than once in `ids`.
pub(crate) fn check_unique(ids: &[String], section: &str, report: &mut Report) {
    let mut seen = HashSet::with_capacity(ids.len());
    for (idx, id) in ids.iter().enumerate() {
        if !seen.insert(id) {
            report.add_result(ValidationResult::new(
                format!("/{section}/{idx}"),
                format!("Identifier '{id}' is declared more than once in {section}."),
                Severity::Error,
                Some(id.clone()),
            ));
        }
    }
}

/// Reports ids that cannot be referenced as a formula symbol.
///
/// Every id must be a plain identifier. With `reserve_builtins`, ids that
/// collide with one of the [`BUILTIN_SYMBOLS`] are rejected as well.
pub(crate) fn check_identifiers<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    section: &str,
    reserve_builtins: bool,
    report: &mut Report,
) {
    for (idx, id) in ids.into_iter().enumerate() {
        let message = if !IDENTIFIER.is_match(id) {
            format!("Identifier '{id}' in {section} is not a valid symbol name.")
        } else if reserve_builtins && BUILTIN_SYMBOLS.contains(&id) {
            format!("Identifier '{id}' in {section} is reserved for a builtin symbol.")
        } else {
            continue;
        };

        report.add_result(ValidationResult::new(
            format!("/{section}/{idx}"),
            message,
            Severity::Error,
            Some(id.to_string()),
        ));
    }
}

/// Species, parameters and builtin symbols that formulas may reference.
pub(crate) fn known_symbols(model: &ModelDefinition) -> HashSet<&str> {
    model
        .species
        .iter()
        .chain(&model.parameters)
        .map(String::as_str)
        .chain(BUILTIN_SYMBOLS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_model;
    use crate::model::ModelDefinitionBuilder;

    #[test]
    fn test_valid_model() {
        let model = load_model("tests/data/chain_model.json").expect("Failed to load model");
        let report = check_consistency(&model);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_inconsistent_model() {
        let model = load_model("tests/data/inconsistent_model.json").expect("Failed to load model");
        let report = check_consistency(&model);
        assert!(!report.is_valid);
        assert_eq!(report.with_severity(Severity::Error).len(), 3);
        assert_eq!(report.filter_results("A").len(), 1);
    }

    #[test]
    fn test_duplicate_species() {
        let model = ModelDefinitionBuilder::default()
            .name("dup")
            .species(vec!["A".into(), "B".into(), "A".into()])
            .build()
            .expect("Failed to build model");

        let report = check_consistency(&model);
        assert!(!report.is_valid);
        assert_eq!(report.errors[0].location(), "/species/2");
    }

    #[test]
    fn test_identifiers() {
        let mut report = Report::new();
        check_identifiers(["k_1", "_B2", "v-1", "2A", "e"], "parameters", true, &mut report);

        assert!(!report.is_valid);
        let locations: Vec<&str> = report.errors.iter().map(|r| r.location()).collect();
        assert_eq!(
            locations,
            vec!["/parameters/2", "/parameters/3", "/parameters/4"]
        );

        let mut report = Report::new();
        check_identifiers(["t", "pi"], "reactions", false, &mut report);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }
}
