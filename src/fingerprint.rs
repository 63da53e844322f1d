//! Structural fingerprints of model definitions.
//!
//! The fingerprint is a non-cryptographic identity key: two definitions that
//! only differ in their initial values share it, while any structural change
//! (including the order of species or parameters) produces a different one.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{ModelDefinition, OdeSource, Reaction};

/// Borrowed view of every structural field of a definition.
///
/// Field order is fixed by the struct declaration and all maps are ordered,
/// so the serialization is canonical.
#[derive(Serialize)]
struct StructuralView<'a> {
    name: &'a str,
    species: &'a [String],
    parameters: &'a [String],
    reactions: &'a Option<Vec<Reaction>>,
    ode_source: &'a OdeSource,
    algebraic_equations: &'a Option<BTreeMap<String, String>>,
    units: &'a Option<BTreeMap<String, String>>,
    states: &'a Option<BTreeMap<String, String>>,
    species_annotations: &'a Option<BTreeMap<String, String>>,
    species_compartments: &'a Option<BTreeMap<String, String>>,
    species_names: &'a Option<BTreeMap<String, String>>,
    compartment_annotations: &'a Option<BTreeMap<String, String>>,
    reaction_names: &'a Option<BTreeMap<String, String>>,
}

impl<'a> From<&'a ModelDefinition> for StructuralView<'a> {
    fn from(model: &'a ModelDefinition) -> Self {
        StructuralView {
            name: &model.name,
            species: &model.species,
            parameters: &model.parameters,
            reactions: &model.reactions,
            ode_source: &model.ode_source,
            algebraic_equations: &model.algebraic_equations,
            units: &model.units,
            states: &model.states,
            species_annotations: &model.species_annotations,
            species_compartments: &model.species_compartments,
            species_names: &model.species_names,
            compartment_annotations: &model.compartment_annotations,
            reaction_names: &model.reaction_names,
        }
    }
}

/// Computes the fingerprint of a definition, ignoring initial values.
pub fn fingerprint(model: &ModelDefinition) -> u64 {
    let view = StructuralView::from(model);
    // Serializing plain structs, strings, floats and ordered maps cannot fail.
    let canonical = serde_json::to_vec(&view).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
