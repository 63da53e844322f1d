use std::collections::{BTreeMap, HashSet};

use crate::expression::Expression;
use crate::model::{ModelDefinition, OdeSource};
use crate::validation::consistency::{known_symbols, Report, Severity, ValidationResult};

/// Validates the equations of a definition
///
/// # Arguments
/// * `model` - The definition containing the equations to validate
/// * `report` - Validation report to add results to
///
/// # Details
/// Direct ODEs and algebraic equations must be keyed by declared species.
/// Symbols used in rate laws and equations that are neither species,
/// parameters nor builtins are reported as warnings, as are formulas that
/// cannot be parsed.
pub fn check_equations(model: &ModelDefinition, report: &mut Report) {
    let known = known_symbols(model);

    if let OdeSource::Direct { odes } = &model.ode_source {
        check_equation_section(model, odes, "/ode_source/odes", &known, report);
    }

    if let Some(equations) = &model.algebraic_equations {
        check_equation_section(model, equations, "/algebraic_equations", &known, report);
    }

    for (reaction_idx, reaction) in model.reactions.iter().flatten().enumerate() {
        if let Some(rate) = &reaction.rate {
            check_symbols(
                rate,
                &format!("/reactions/{reaction_idx}/rate"),
                &reaction.id,
                &known,
                report,
            );
        }
    }
}

fn check_equation_section(
    model: &ModelDefinition,
    equations: &BTreeMap<String, String>,
    location: &str,
    known: &HashSet<&str>,
    report: &mut Report,
) {
    for (species_id, equation) in equations {
        let location = format!("{location}/{species_id}");
        if !model.species.contains(species_id) {
            report.add_result(ValidationResult::new(
                location.clone(),
                format!("Equation is given for undeclared species '{species_id}'."),
                Severity::Error,
                Some(species_id.clone()),
            ));
        }

        check_symbols(equation, &location, species_id, known, report);
    }
}

fn check_symbols(
    formula: &str,
    location: &str,
    identifier: &str,
    known: &HashSet<&str>,
    report: &mut Report,
) {
    let expr = match Expression::parse(formula) {
        Ok(expr) => expr,
        Err(err) => {
            report.add_result(ValidationResult::new(
                location.to_string(),
                format!("Formula '{formula}' could not be parsed: {err}"),
                Severity::Warning,
                Some(identifier.to_string()),
            ));
            return;
        }
    };

    let mut unknown: Vec<String> = expr
        .symbols()
        .into_iter()
        .filter(|symbol| !known.contains(symbol.as_str()))
        .collect();
    unknown.sort();

    for symbol in unknown {
        report.add_result(ValidationResult::new(
            location.to_string(),
            format!("Symbol '{symbol}' is neither a species nor a parameter."),
            Severity::Warning,
            Some(identifier.to_string()),
        ));
    }
}
