//! The compile pipeline.
//!
//! A definition is validated, optionally cleaned, fingerprinted and its ODE
//! section is assembled into a [`CompiledModel`]. The compiled model can then
//! be rendered into any [`Dialect`] and written by the [`ModuleWriter`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::dialect::clean_formula;
use crate::emit::c::render_c_module;
use crate::emit::module::{Dialect, GeneratedModule};
use crate::emit::python::render_python_module;
use crate::emit::writer::ModuleWriter;
use crate::error::CompileError;
use crate::fingerprint::fingerprint;
use crate::model::{ModelDefinition, OdeSource};
use crate::naming::sanitize_name;
use crate::system::{derive_odes, DerivedOde};
use crate::validation::consistency::{check_consistency, Severity};

/// Options of a compile run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct CompileOptions {
    /// Run every rate, direct ODE and algebraic equation through
    /// [`clean_formula`] before embedding it.
    #[builder(default)]
    pub clean_formulas: bool,

    /// Docstring of the generated Python entry point.
    #[builder(default, setter(into))]
    pub doc: String,

    /// Output directory of Python modules.
    #[builder(default = "PathBuf::from(Dialect::Python.default_dir())", setter(into))]
    pub python_dir: PathBuf,

    /// Output directory of C modules.
    #[builder(default = "PathBuf::from(Dialect::C.default_dir())", setter(into))]
    pub c_dir: PathBuf,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            clean_formulas: false,
            doc: String::new(),
            python_dir: PathBuf::from(Dialect::Python.default_dir()),
            c_dir: PathBuf::from(Dialect::C.default_dir()),
        }
    }
}

impl CompileOptions {
    /// Writer targeting the configured output directories.
    pub fn writer(&self) -> ModuleWriter {
        ModuleWriter::new(&self.python_dir, &self.c_dir)
    }
}

/// Right-hand side of one dynamic species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdeEquation {
    pub species_id: String,
    /// Fully substituted right-hand side.
    pub formula: String,
    /// The same sum over reaction id placeholders. Only set when the ODE
    /// was derived from the stoichiometric matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flux_formula: Option<String>,
}

impl From<DerivedOde> for OdeEquation {
    fn from(ode: DerivedOde) -> Self {
        OdeEquation {
            species_id: ode.species_id,
            formula: ode.formula,
            flux_formula: Some(ode.flux_formula),
        }
    }
}

/// A validated definition together with its assembled ODE section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledModel {
    /// Sanitized model name, used for file names.
    pub name: String,
    /// Structural fingerprint of the input definition.
    pub fingerprint: u64,
    /// The definition as embedded in generated modules.
    pub definition: ModelDefinition,
    /// ODEs of the dynamic species, in species order.
    pub odes: Vec<OdeEquation>,
}

impl CompiledModel {
    /// Looks up the ODE of a species.
    pub fn ode(&self, species_id: &str) -> Option<&OdeEquation> {
        self.odes.iter().find(|ode| ode.species_id == species_id)
    }

    /// Ids of the species governed by an ODE.
    pub fn dynamic_species(&self) -> Vec<&str> {
        self.odes.iter().map(|ode| ode.species_id.as_str()).collect()
    }

    /// Renders the model in the given dialect.
    pub fn render(
        &self,
        dialect: Dialect,
        options: &CompileOptions,
    ) -> Result<GeneratedModule, CompileError> {
        match dialect {
            Dialect::Python => render_python_module(self, &options.doc),
            Dialect::C => render_c_module(self),
        }
    }
}

/// Compiles a model definition.
///
/// This function performs the following steps:
/// 1. Checks the consistency of the definition
/// 2. Fingerprints the definition
/// 3. Cleans the formulas, if enabled
/// 4. Derives the ODEs from the stoichiometry, or takes the direct ODEs
///
/// # Arguments
///
/// * `model` - The definition to compile
/// * `options` - Compile options
///
/// # Returns
///
/// * `Result<CompiledModel, CompileError>` - The compiled model, or the first
///   fatal error. Nothing is written.
pub fn compile(
    model: &ModelDefinition,
    options: &CompileOptions,
) -> Result<CompiledModel, CompileError> {
    let report = check_consistency(model);
    for result in report.with_severity(Severity::Warning) {
        log::warn!("{}: {} ({})", model.name, result.message(), result.location());
    }
    if !report.is_valid {
        let errors = report
            .with_severity(Severity::Error)
            .into_iter()
            .cloned()
            .collect();
        return Err(CompileError::Inconsistent(errors));
    }

    let fingerprint = fingerprint(model);
    let definition = if options.clean_formulas {
        clean_definition(model)
    } else {
        model.clone()
    };

    let odes = match &definition.ode_source {
        OdeSource::Stoichiometric(_) => derive_odes(&definition)?
            .into_iter()
            .map(OdeEquation::from)
            .collect(),
        OdeSource::Direct { odes } => direct_odes(&definition, odes),
    };

    let name = sanitize_name(&definition.name);
    log::debug!(
        "Compiled model '{}' ({} ODEs, fingerprint {:016x})",
        name,
        odes.len(),
        fingerprint
    );

    Ok(CompiledModel {
        name,
        fingerprint,
        definition,
        odes,
    })
}

/// Compiles a definition and writes it in the given dialect.
///
/// # Returns
///
/// * `Result<PathBuf, CompileError>` - Path of the written module
pub fn compile_to_file(
    model: &ModelDefinition,
    dialect: Dialect,
    options: &CompileOptions,
) -> Result<PathBuf, CompileError> {
    let compiled = compile(model, options)?;
    let module = compiled.render(dialect, options)?;
    options.writer().write(&module)
}

/// Direct ODEs of the declared species, in species order.
fn direct_odes(model: &ModelDefinition, odes: &BTreeMap<String, String>) -> Vec<OdeEquation> {
    model
        .species
        .iter()
        .filter_map(|species_id| {
            odes.get(species_id).map(|formula| OdeEquation {
                species_id: species_id.clone(),
                formula: formula.clone(),
                flux_formula: None,
            })
        })
        .collect()
}

fn clean_definition(model: &ModelDefinition) -> ModelDefinition {
    let clean_all = |equations: &BTreeMap<String, String>| -> BTreeMap<String, String> {
        equations
            .iter()
            .map(|(id, formula)| (id.clone(), clean_formula(formula)))
            .collect()
    };

    let mut cleaned = model.clone();
    for reaction in cleaned.reactions.iter_mut().flatten() {
        reaction.rate = reaction.rate.as_deref().map(clean_formula);
    }
    if let OdeSource::Direct { odes } = &mut cleaned.ode_source {
        *odes = clean_all(odes);
    }
    cleaned.algebraic_equations = cleaned.algebraic_equations.as_ref().map(clean_all);
    cleaned
}
