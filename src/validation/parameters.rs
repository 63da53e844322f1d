use crate::model::ModelDefinition;
use crate::validation::consistency::{
    check_identifiers, check_unique, Report, Severity, ValidationResult,
};

/// Validates the parameters of a definition
///
/// # Arguments
/// * `model` - The definition containing the parameters to validate
/// * `report` - Validation report to add results to
///
/// # Details
/// Parameter ids must be unique identifiers and must not shadow a species
/// or a builtin symbol. Parameters
/// without an initial value get an informational note, because the compiler
/// falls back to the default value for them.
pub fn check_parameters(model: &ModelDefinition, report: &mut Report) {
    check_unique(&model.parameters, "parameters", report);
    check_identifiers(
        model.parameters.iter().map(String::as_str),
        "parameters",
        true,
        report,
    );

    for (param_idx, parameter) in model.parameters.iter().enumerate() {
        if model.species.contains(parameter) {
            report.add_result(ValidationResult::new(
                format!("/parameters/{param_idx}"),
                format!("Parameter '{parameter}' has the same id as a species."),
                Severity::Error,
                Some(parameter.clone()),
            ));
        }

        if !model.initial_parameter_values.contains_key(parameter) {
            report.add_result(ValidationResult::new(
                format!("/parameters/{param_idx}"),
                format!(
                    "Parameter '{parameter}' has no initial value. The default value will be used."
                ),
                Severity::Info,
                Some(parameter.clone()),
            ));
        }
    }

    for parameter in model.initial_parameter_values.keys() {
        if !model.parameters.contains(parameter) {
            report.add_result(ValidationResult::new(
                format!("/initial_parameter_values/{parameter}"),
                format!("Initial value given for undeclared parameter '{parameter}'."),
                Severity::Warning,
                Some(parameter.clone()),
            ));
        }
    }
}
