//! Data model for reaction network definitions.
//!
//! A [`ModelDefinition`] is the input of the compile pipeline. It carries the
//! ordered species and parameter lists, initial values, the reactions with their
//! rate laws and the source of the ODE system, which is either a stoichiometric
//! matrix over the reactions or a set of right-hand sides given directly.
//!
//! Optional annotation sections are explicit `Option` fields. All mappings are
//! ordered maps, so serializing a definition is canonical.

use std::collections::BTreeMap;

use derive_builder::Builder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Initial value used for species and parameters without an explicit value.
pub const DEFAULT_INITIAL_VALUE: f64 = 0.1;

/// Declarative description of a reaction network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Builder, Default)]
pub struct ModelDefinition {
    /// Free-form display name of the model.
    #[builder(setter(into))]
    pub name: String,

    /// Ordered species identifiers. The order defines the rows of the
    /// stoichiometric matrix and is preserved in all generated output.
    #[builder(default, setter(into, each(name = "to_species")))]
    pub species: Vec<String>,

    /// Ordered parameter identifiers.
    #[serde(default)]
    #[builder(default, setter(into, each(name = "to_parameters")))]
    pub parameters: Vec<String>,

    /// Initial values of the species.
    #[serde(default)]
    #[builder(default, setter(into))]
    pub initial_species_values: BTreeMap<String, f64>,

    /// Initial values of the parameters.
    #[serde(default)]
    #[builder(default, setter(into))]
    pub initial_parameter_values: BTreeMap<String, f64>,

    /// Reactions of the network. `None` means the definition carries no
    /// reaction structure at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub reactions: Option<Vec<Reaction>>,

    /// Where the ODE right-hand sides come from.
    #[builder(default)]
    pub ode_source: OdeSource,

    /// Species governed by an algebraic constraint instead of an ODE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub algebraic_equations: Option<BTreeMap<String, String>>,

    /// Units of the species.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub units: Option<BTreeMap<String, String>>,

    /// States of the species.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub states: Option<BTreeMap<String, String>>,

    /// Free-text annotations of the species.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub species_annotations: Option<BTreeMap<String, String>>,

    /// Compartment each species lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub species_compartments: Option<BTreeMap<String, String>>,

    /// Human readable species names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub species_names: Option<BTreeMap<String, String>>,

    /// Free-text annotations of the compartments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub compartment_annotations: Option<BTreeMap<String, String>>,

    /// Human readable reaction names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub reaction_names: Option<BTreeMap<String, String>>,
}

/// A single reaction of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Builder, Default)]
pub struct Reaction {
    /// Unique identifier of the reaction.
    #[builder(setter(into))]
    pub id: String,

    /// Rate law of the reaction. Reactions without a rate do not take part
    /// in the flux vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub rate: Option<String>,

    /// Consumed species and their stoichiometry.
    #[serde(default)]
    #[builder(default, setter(into))]
    pub substrates: BTreeMap<String, f64>,

    /// Produced species and their stoichiometry.
    #[serde(default)]
    #[builder(default, setter(into))]
    pub products: BTreeMap<String, f64>,

    /// Species influencing the reaction without being consumed or produced.
    #[serde(default)]
    #[builder(default, setter(into))]
    pub modifiers: BTreeMap<String, f64>,
}

/// Source of the ODE right-hand sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OdeSource {
    /// Derive the ODEs from the stoichiometric matrix and the reaction rates.
    Stoichiometric(StoichiometricMatrix),
    /// Right-hand sides given per species.
    Direct { odes: BTreeMap<String, String> },
}

impl Default for OdeSource {
    fn default() -> Self {
        OdeSource::Direct {
            odes: BTreeMap::new(),
        }
    }
}

/// Species × reaction matrix of net signed stoichiometric coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Builder, Default)]
pub struct StoichiometricMatrix {
    /// Reaction ids of the columns. When empty, the columns are matched
    /// positionally to the reactions that define a rate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_reaction_ids")))]
    pub reaction_ids: Vec<String>,

    /// Row-major coefficients, one row per species.
    #[builder(setter(into))]
    pub coefficients: Vec<Vec<f64>>,
}

impl ModelDefinition {
    /// Builds a direct-ODE definition from parallel lists.
    ///
    /// Species are zipped with their right-hand sides. Empty initial value
    /// lists fall back to [`DEFAULT_INITIAL_VALUE`] for every entry.
    pub fn from_odes(
        name: impl Into<String>,
        species: Vec<String>,
        parameters: Vec<String>,
        odes: Vec<String>,
        x0: Vec<f64>,
        p0: Vec<f64>,
    ) -> Self {
        let initial_species_values = zip_initial_values(&species, &x0);
        let initial_parameter_values = zip_initial_values(&parameters, &p0);
        let odes = species.iter().cloned().zip(odes).collect();

        ModelDefinition {
            name: name.into(),
            species,
            parameters,
            initial_species_values,
            initial_parameter_values,
            ode_source: OdeSource::Direct { odes },
            ..Default::default()
        }
    }

    /// Initial value of a species, or the default sentinel.
    pub fn initial_species_value(&self, species_id: &str) -> f64 {
        self.initial_species_values
            .get(species_id)
            .copied()
            .unwrap_or(DEFAULT_INITIAL_VALUE)
    }

    /// Initial value of a parameter, or the default sentinel.
    pub fn initial_parameter_value(&self, parameter_id: &str) -> f64 {
        self.initial_parameter_values
            .get(parameter_id)
            .copied()
            .unwrap_or(DEFAULT_INITIAL_VALUE)
    }

    /// Reactions that define a rate, in declaration order.
    pub fn rated_reactions(&self) -> Vec<&Reaction> {
        self.reactions
            .iter()
            .flatten()
            .filter(|r| r.rate.is_some())
            .collect()
    }

    /// Looks up a reaction by id.
    pub fn reaction(&self, reaction_id: &str) -> Option<&Reaction> {
        self.reactions.iter().flatten().find(|r| r.id == reaction_id)
    }

    /// Whether the ODEs are derived from reactions.
    pub fn is_stoichiometric(&self) -> bool {
        matches!(self.ode_source, OdeSource::Stoichiometric(_))
    }
}

fn zip_initial_values(ids: &[String], values: &[f64]) -> BTreeMap<String, f64> {
    if values.is_empty() {
        ids.iter()
            .map(|id| (id.clone(), DEFAULT_INITIAL_VALUE))
            .collect()
    } else {
        ids.iter().cloned().zip(values.iter().copied()).collect()
    }
}
