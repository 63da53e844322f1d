use std::collections::HashSet;

use crate::model::{ModelDefinition, OdeSource, Reaction};
use crate::validation::consistency::{check_identifiers, Report, Severity, ValidationResult};

/// Validates the reactions of a definition
///
/// # Arguments
/// * `model` - The definition containing the reactions to validate
/// * `report` - Validation report to add results to
///
/// # Details
/// Checks that reaction ids are unique identifiers, that the species taking part in a
/// reaction are declared and, in stoichiometric mode, that reactions exist and
/// every explicit matrix column names a distinct reaction with a rate.
pub fn check_reactions(model: &ModelDefinition, report: &mut Report) {
    let reactions = model.reactions.as_deref().unwrap_or_default();

    check_duplicate_ids(reactions, report);
    check_identifiers(
        reactions.iter().map(|r| r.id.as_str()),
        "reactions",
        false,
        report,
    );

    for (reaction_idx, reaction) in reactions.iter().enumerate() {
        check_participants(model, reaction, reaction_idx, report);
    }

    if let OdeSource::Stoichiometric(matrix) = &model.ode_source {
        if reactions.is_empty() {
            report.add_result(ValidationResult::new(
                "/reactions".to_string(),
                "ODEs are derived from the stoichiometric matrix, but the model has no reactions."
                    .to_string(),
                Severity::Error,
                None,
            ));
        }

        let mut seen = HashSet::new();
        for (column_idx, reaction_id) in matrix.reaction_ids.iter().enumerate() {
            if !seen.insert(reaction_id.as_str()) {
                report.add_result(ValidationResult::new(
                    format!("/ode_source/reaction_ids/{column_idx}"),
                    format!("Reaction '{reaction_id}' names more than one matrix column."),
                    Severity::Error,
                    Some(reaction_id.clone()),
                ));
                continue;
            }
            check_column(model, reaction_id, column_idx, report);
        }
    }
}

fn check_duplicate_ids(reactions: &[Reaction], report: &mut Report) {
    let mut seen = HashSet::new();
    for (reaction_idx, reaction) in reactions.iter().enumerate() {
        if !seen.insert(reaction.id.as_str()) {
            report.add_result(ValidationResult::new(
                format!("/reactions/{reaction_idx}"),
                format!("Reaction id '{}' is used more than once.", reaction.id),
                Severity::Error,
                Some(reaction.id.clone()),
            ));
        }
    }
}

/// Checks that substrates, products and modifiers are declared species.
fn check_participants(
    model: &ModelDefinition,
    reaction: &Reaction,
    reaction_idx: usize,
    report: &mut Report,
) {
    let roles = [
        ("substrates", &reaction.substrates),
        ("products", &reaction.products),
        ("modifiers", &reaction.modifiers),
    ];

    for (role, participants) in roles {
        for species_id in participants.keys() {
            if !model.species.contains(species_id) {
                report.add_result(ValidationResult::new(
                    format!("/reactions/{reaction_idx}/{role}/{species_id}"),
                    format!(
                        "Species '{}' in reaction '{}' is not declared.",
                        species_id, reaction.id
                    ),
                    Severity::Warning,
                    Some(reaction.id.clone()),
                ));
            }
        }
    }
}

fn check_column(
    model: &ModelDefinition,
    reaction_id: &str,
    column_idx: usize,
    report: &mut Report,
) {
    let location = format!("/ode_source/reaction_ids/{column_idx}");
    match model.reaction(reaction_id) {
        None => report.add_result(ValidationResult::new(
            location,
            format!("Matrix column names unknown reaction '{reaction_id}'."),
            Severity::Error,
            Some(reaction_id.to_string()),
        )),
        Some(reaction) if reaction.rate.is_none() => report.add_result(ValidationResult::new(
            location,
            format!("Matrix column names reaction '{reaction_id}', which has no rate."),
            Severity::Error,
            Some(reaction_id.to_string()),
        )),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelDefinitionBuilder, ReactionBuilder, StoichiometricMatrixBuilder};
    use std::collections::BTreeMap;

    fn create_model(reactions: Vec<Reaction>, reaction_ids: Vec<String>) -> ModelDefinition {
        ModelDefinitionBuilder::default()
            .name("test")
            .species(vec!["A".into(), "B".into()])
            .reactions(reactions)
            .ode_source(OdeSource::Stoichiometric(
                StoichiometricMatrixBuilder::default()
                    .reaction_ids(reaction_ids)
                    .coefficients(vec![vec![-1.0], vec![1.0]])
                    .build()
                    .unwrap(),
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_reaction() {
        let reaction = ReactionBuilder::default()
            .id("r1")
            .rate("k*A")
            .substrates(BTreeMap::from([("A".to_string(), 1.0)]))
            .products(BTreeMap::from([("B".to_string(), 1.0)]))
            .build()
            .unwrap();

        let mut report = Report::new();
        check_reactions(&create_model(vec![reaction], vec!["r1".into()]), &mut report);
        assert!(report.errors.is_empty(), "{:#?}", report.errors);
    }

    #[test]
    fn test_undeclared_participant() {
        let reaction = ReactionBuilder::default()
            .id("r1")
            .rate("k*A")
            .modifiers(BTreeMap::from([("E".to_string(), 1.0)]))
            .build()
            .unwrap();

        let mut report = Report::new();
        check_reactions(&create_model(vec![reaction], vec![]), &mut report);
        assert!(report.is_valid);
        assert_eq!(report.errors[0].location(), "/reactions/0/modifiers/E");
    }

    #[test]
    fn test_column_without_rate() {
        let reactions = vec![
            ReactionBuilder::default().id("r1").build().unwrap(),
            ReactionBuilder::default().id("r1").rate("k").build().unwrap(),
        ];

        let mut report = Report::new();
        check_reactions(
            &create_model(reactions, vec!["r1".into(), "r9".into()]),
            &mut report,
        );
        assert!(!report.is_valid);
        // duplicate id, column without rate, unknown column
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.filter_results("r9").len(), 1);
    }

    #[test]
    fn test_repeated_column_id() {
        let reactions = vec![
            ReactionBuilder::default().id("r1").rate("k1*A").build().unwrap(),
            ReactionBuilder::default().id("r2").rate("k2*B").build().unwrap(),
        ];

        let mut report = Report::new();
        check_reactions(
            &create_model(reactions, vec!["r1".into(), "r1".into()]),
            &mut report,
        );
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].location(), "/ode_source/reaction_ids/1");
    }

    #[test]
    fn test_reaction_id_must_be_identifier() {
        let reactions = vec![
            ReactionBuilder::default().id("v-1").rate("k1*A").build().unwrap(),
            ReactionBuilder::default().id("v_2").rate("k2*B").build().unwrap(),
        ];

        let mut report = Report::new();
        check_reactions(&create_model(reactions, vec![]), &mut report);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].location(), "/reactions/0");
        assert_eq!(report.filter_results("v-1").len(), 1);
    }

    #[test]
    fn test_stoichiometric_without_reactions() {
        let mut report = Report::new();
        check_reactions(&create_model(vec![], vec![]), &mut report);
        assert!(!report.is_valid);
        assert_eq!(report.errors[0].location(), "/reactions");
    }
}
