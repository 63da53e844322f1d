use crate::model::ModelDefinition;
use crate::validation::consistency::{
    check_identifiers, check_unique, Report, Severity, ValidationResult,
};

/// Validates the species of a definition
///
/// # Arguments
/// * `model` - The definition whose species are validated
/// * `report` - Validation report to add results to
///
/// # Details
/// Species ids must be unique identifiers that do not shadow a builtin
/// symbol such as `t` or `pi`. Initial values given for undeclared species
/// are reported as warnings, since they are ignored by the compiler.
pub fn check_species(model: &ModelDefinition, report: &mut Report) {
    check_unique(&model.species, "species", report);
    check_identifiers(model.species.iter().map(String::as_str), "species", true, report);

    for species_id in model.initial_species_values.keys() {
        if !model.species.contains(species_id) {
            report.add_result(ValidationResult::new(
                format!("/initial_species_values/{species_id}"),
                format!("Initial value given for undeclared species '{species_id}'."),
                Severity::Warning,
                Some(species_id.clone()),
            ));
        }
    }
}
