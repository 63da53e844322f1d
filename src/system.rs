//! ODE System Generation from Stoichiometry
//!
//! This module derives the right-hand sides of an ODE system from a
//! stoichiometric matrix `N` and the rate laws of the reactions. The flux
//! vector `v` holds one placeholder per reaction, the symbolic product
//! `xdot = N · v` yields one linear combination of fluxes per species, and the
//! placeholders are finally replaced by the rate laws.
//!
//! The main components include:
//! - Building the flux vector and the stoichiometry array of a definition
//! - Symbolic matrix-vector multiplication into [`LinearCombination`]s
//! - Rendering linear combinations as formulas with correct grouping
//! - Substituting flux placeholders by rate laws

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::expression::Expression;
use crate::formula::{format_decimal, substitute_identifiers};
use crate::model::{ModelDefinition, OdeSource, Reaction, StoichiometricMatrix};

/// One term `coefficient * flux` of a linear combination.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxTerm {
    pub coefficient: f64,
    pub reaction_id: String,
}

/// Row of `xdot = N · v`: a sum of scaled flux placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearCombination {
    pub terms: Vec<FluxTerm>,
}

impl LinearCombination {
    /// Whether the combination has no terms, i.e. the row of `N` is zero.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Renders the combination over reaction-id placeholders.
    ///
    /// Coefficients of `1` and `-1` are implied, other coefficients are written
    /// as decimal literals. Placeholders listed in `grouped` stand for sums and
    /// are wrapped in parentheses wherever they are negated or scaled.
    ///
    /// # Arguments
    ///
    /// * `grouped` - Reaction ids whose rate law is a top-level sum or difference
    ///
    /// # Returns
    ///
    /// * `String` - The formula, or `"0"` for an empty combination
    pub fn to_formula(&self, grouped: &HashSet<String>) -> String {
        if self.is_zero() {
            return "0".to_string();
        }

        let mut formula = String::new();
        for (i, term) in self.terms.iter().enumerate() {
            let magnitude = term.coefficient.abs();
            let negative = term.coefficient < 0.0;
            let needs_group = grouped.contains(&term.reaction_id) && (negative || magnitude != 1.0);
            let operand = if needs_group {
                format!("({})", term.reaction_id)
            } else {
                term.reaction_id.clone()
            };

            let scaled = if magnitude == 1.0 {
                operand
            } else {
                format!("{}*{}", format_decimal(magnitude), operand)
            };

            match (i, negative) {
                (0, false) => formula.push_str(&scaled),
                (0, true) => {
                    formula.push('-');
                    formula.push_str(&scaled);
                }
                (_, false) => {
                    formula.push_str(" + ");
                    formula.push_str(&scaled);
                }
                (_, true) => {
                    formula.push_str(" - ");
                    formula.push_str(&scaled);
                }
            }
        }

        formula
    }
}

impl Display for LinearCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_formula(&HashSet::new()))
    }
}

/// A derived ODE for one dynamic species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedOde {
    /// The species governed by the ODE.
    pub species_id: String,
    /// Right-hand side over reaction-id placeholders.
    pub flux_formula: String,
    /// Right-hand side with every placeholder replaced by its rate law.
    pub formula: String,
}

/// Symbolic matrix-vector product `N · v`.
///
/// Row `i` of the result is the sum over `j` of `N[i][j] * v[j]`, with zero
/// coefficients dropped.
pub fn matrix_multiply(stoichiometry: &Array2<f64>, fluxes: &[String]) -> Vec<LinearCombination> {
    stoichiometry
        .rows()
        .into_iter()
        .map(|row| LinearCombination {
            terms: row
                .iter()
                .zip(fluxes)
                .filter(|(coefficient, _)| **coefficient != 0.0)
                .map(|(coefficient, reaction_id)| FluxTerm {
                    coefficient: *coefficient,
                    reaction_id: reaction_id.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Collects the reactions forming the flux vector, in column order.
///
/// Columns are matched to the explicit `reaction_ids` of the matrix when
/// given, otherwise positionally to the reactions that define a rate.
///
/// # Errors
///
/// Returns an error if an explicit column id is unknown or has no rate, or if
/// the columns do not name every rated reaction exactly once.
pub fn flux_vector<'a>(
    model: &'a ModelDefinition,
    matrix: &StoichiometricMatrix,
) -> Result<Vec<&'a Reaction>, CompileError> {
    let rated = model.rated_reactions();

    if matrix.reaction_ids.is_empty() {
        return Ok(rated);
    }

    if matrix.reaction_ids.len() != rated.len() {
        return Err(CompileError::StructuralMismatch {
            axis: "reaction columns",
            expected: rated.len(),
            found: matrix.reaction_ids.len(),
        });
    }

    let distinct: HashSet<&str> = matrix.reaction_ids.iter().map(String::as_str).collect();
    if distinct.len() != rated.len() {
        return Err(CompileError::StructuralMismatch {
            axis: "distinct reaction columns",
            expected: rated.len(),
            found: distinct.len(),
        });
    }

    matrix
        .reaction_ids
        .iter()
        .map(|id| {
            rated
                .iter()
                .find(|r| &r.id == id)
                .copied()
                .ok_or_else(|| CompileError::UnresolvedReference {
                    id: id.clone(),
                    mapping: "reactions".to_string(),
                })
        })
        .collect()
}

/// Converts the row-major coefficients into a species × reaction array.
///
/// # Errors
///
/// Returns `StructuralMismatch` if the row count differs from the number of
/// species or any row length differs from the number of fluxes.
pub fn stoichiometry_array(
    matrix: &StoichiometricMatrix,
    n_species: usize,
    n_fluxes: usize,
) -> Result<Array2<f64>, CompileError> {
    if matrix.coefficients.len() != n_species {
        return Err(CompileError::StructuralMismatch {
            axis: "species rows",
            expected: n_species,
            found: matrix.coefficients.len(),
        });
    }

    if let Some(row) = matrix.coefficients.iter().find(|row| row.len() != n_fluxes) {
        return Err(CompileError::StructuralMismatch {
            axis: "reaction columns",
            expected: n_fluxes,
            found: row.len(),
        });
    }

    Ok(Array2::from_shape_fn((n_species, n_fluxes), |(i, j)| {
        matrix.coefficients[i][j]
    }))
}

/// Derives the ODEs of every dynamic species from the stoichiometry.
///
/// This function performs the following steps:
/// 1. Builds the flux vector from the rated reactions
/// 2. Computes `xdot = N · v`
/// 3. Substitutes each flux placeholder by the reaction's rate law
/// 4. Keeps only species with a non-zero row
///
/// # Arguments
///
/// * `model` - The definition, which must use a stoichiometric ODE source
///
/// # Returns
///
/// * `Result<Vec<DerivedOde>, CompileError>` - The ODEs in species order
pub fn derive_odes(model: &ModelDefinition) -> Result<Vec<DerivedOde>, CompileError> {
    let matrix = match &model.ode_source {
        OdeSource::Stoichiometric(matrix) => matrix,
        OdeSource::Direct { .. } => return Ok(Vec::new()),
    };

    let reactions = flux_vector(model, matrix)?;
    let stoichiometry = stoichiometry_array(matrix, model.species.len(), reactions.len())?;

    let fluxes: Vec<String> = reactions.iter().map(|r| r.id.clone()).collect();
    let rates: HashMap<String, String> = reactions
        .iter()
        .filter_map(|r| r.rate.as_ref().map(|rate| (r.id.clone(), rate.clone())))
        .collect();
    let grouped = additive_rates(&rates);

    let xdot = matrix_multiply(&stoichiometry, &fluxes);
    log::debug!(
        "Assembled {} rows over {} fluxes for model '{}'",
        xdot.len(),
        fluxes.len(),
        model.name
    );

    let odes = model
        .species
        .iter()
        .zip(xdot)
        .filter(|(_, row)| !row.is_zero())
        .map(|(species_id, row)| {
            let flux_formula = row.to_formula(&grouped);
            let formula = substitute_identifiers(&flux_formula, &rates);
            DerivedOde {
                species_id: species_id.clone(),
                flux_formula,
                formula,
            }
        })
        .collect();

    Ok(odes)
}

/// Reaction ids whose rate law must be grouped when negated or scaled.
/// Rates that cannot be parsed are grouped as well.
pub fn additive_rates(rates: &HashMap<String, String>) -> HashSet<String> {
    rates
        .iter()
        .filter(|(_, rate)| {
            Expression::parse(rate)
                .map(|expr| expr.is_additive())
                .unwrap_or(true)
        })
        .map(|(id, _)| id.clone())
        .collect()
}
