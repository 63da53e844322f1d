//! Python module emitter.
//!
//! The generated module defines one function that fills and returns a
//! `module_dict`. ODEs derived from reactions are written as string
//! concatenations over `reactions[<id>]['rate']`, so the module rebuilds the
//! formula text from its own rate entries at runtime.

use std::collections::{BTreeMap, HashMap};

use crate::compile::CompiledModel;
use crate::emit::module::{Diagnostic, Dialect, GeneratedModule};
use crate::error::CompileError;
use crate::formula::format_number;
use crate::model::{ModelDefinition, Reaction};
use crate::naming::python_identifier;
use crate::stringify::{quote, stringify};

/// Separator between the entries of core and annotation sections.
const CONTINUATION: &str = ",\n\t\t\t\t\t\t ";

/// Renders a compiled model as a Python module.
///
/// # Arguments
///
/// * `model` - The compiled model
/// * `doc` - Docstring of the generated function
///
/// # Returns
///
/// * `Result<GeneratedModule, CompileError>` - The module text and its
///   diagnostics, or `UnresolvedReference` if `reaction_names` or
///   `species_names` lack an id that has to be commented
pub fn render_python_module(
    model: &CompiledModel,
    doc: &str,
) -> Result<GeneratedModule, CompileError> {
    let def = &model.definition;
    let mut diagnostics = Vec::new();
    let mut out = String::new();

    out.push_str(&format!("\ndef {}():", python_identifier(&model.name)));
    out.push_str(&format!("\n\t'''\n\t{}\n\t'''\n", doc));
    out.push_str("\tmodule_dict = {}");

    write_core_sections(&mut out, def);

    let optional_sections = [
        ("Species Units", "units", &def.units),
        ("Species States", "states", &def.states),
        ("Species Annotations", "sp_annotations", &def.species_annotations),
        ("Species Compartment", "sp_compartment", &def.species_compartments),
        ("Species Names", "sp_names", &def.species_names),
        (
            "Compartment Annotations",
            "com_annotations",
            &def.compartment_annotations,
        ),
    ];
    for (title, key, section) in optional_sections {
        match section {
            Some(entries) => write_section(&mut out, title, key, &string_dict(entries)),
            None => diagnostics.push(Diagnostic::MissingAnnotation { section: title }),
        }
    }

    if let Some(reactions) = def.reactions.as_deref().filter(|r| !r.is_empty()) {
        write_reactions(&mut out, def, reactions)?;
    }

    if !def.is_stoichiometric() {
        diagnostics.push(Diagnostic::ReactionDerivationSkipped);
    }
    write_odes(&mut out, model)?;

    if let Some(equations) = &def.algebraic_equations {
        write_algebraic_equations(&mut out, def, equations)?;
    }

    out.push_str("\n\n\treturn module_dict\n");

    Ok(GeneratedModule {
        name: model.name.clone(),
        dialect: Dialect::Python,
        source: out,
        diagnostics,
    })
}

fn write_core_sections(out: &mut String, def: &ModelDefinition) {
    let initial_species = def
        .species
        .iter()
        .map(|id| (quote(id), python_float(def.initial_species_value(id))))
        .collect::<Vec<_>>();
    let initial_parameters = def
        .parameters
        .iter()
        .map(|id| (quote(id), python_float(def.initial_parameter_value(id))))
        .collect::<Vec<_>>();

    write_section(out, "Model Name", "name", &quote(&def.name));
    write_section(out, "Model Species", "vars", &string_list(&def.species));
    write_section(out, "Model Parameters", "pars", &string_list(&def.parameters));
    write_section(
        out,
        "Initial Values for Species",
        "initvars",
        &python_dict(initial_species, CONTINUATION),
    );
    write_section(
        out,
        "Initial Values for Parameters",
        "initpars",
        &python_dict(initial_parameters, CONTINUATION),
    );
}

fn write_section(out: &mut String, title: &str, key: &str, value: &str) {
    out.push_str(&format!(
        "\n\n\t### {}:\n\tmodule_dict['{}'] = {}\n",
        title, key, value
    ));
}

fn write_reactions(
    out: &mut String,
    def: &ModelDefinition,
    reactions: &[Reaction],
) -> Result<(), CompileError> {
    out.push_str("\n\n\t### Reactions:\n\treactions = {}\n");
    for reaction in reactions {
        out.push_str(&format!(
            "\treactions[{}] = {{'rate': {{}}, 'products': {{}}, 'substrates': {{}}, 'modifiers': {{}}}}\n",
            quote(&reaction.id)
        ));
    }

    out.push_str("\n\n\t### Rates:\n");
    for reaction in reactions {
        if let Some(rate) = &reaction.rate {
            out.push_str(&comment(&reaction_label(def, &reaction.id)?));
            out.push_str(&format!(
                "\treactions[{}]['rate'] = {}\n",
                quote(&reaction.id),
                quote(rate)
            ));
        }
    }

    let roles: [(&str, &str, fn(&Reaction) -> &BTreeMap<String, f64>); 3] = [
        ("Substrates", "substrates", |r| &r.substrates),
        ("Products", "products", |r| &r.products),
        ("Modifiers", "modifiers", |r| &r.modifiers),
    ];
    for (title, key, participants) in roles {
        out.push_str(&format!("\n\n\t### {}:\n", title));
        for reaction in reactions {
            let entries = participants(reaction)
                .iter()
                .map(|(species_id, coefficient)| (quote(species_id), python_float(*coefficient)))
                .collect();
            out.push_str(&comment(&reaction_label(def, &reaction.id)?));
            out.push_str(&format!(
                "\treactions[{}]['{}'] = {}\n",
                quote(&reaction.id),
                key,
                python_dict(entries, ", ")
            ));
        }
    }

    out.push_str("\n\tmodule_dict['reactions'] = reactions");
    Ok(())
}

fn write_odes(out: &mut String, model: &CompiledModel) -> Result<(), CompileError> {
    let def = &model.definition;
    let references: HashMap<String, String> = def
        .rated_reactions()
        .iter()
        .map(|r| (r.id.clone(), format!("reactions[{}]['rate']", quote(&r.id))))
        .collect();

    out.push_str("\n\n\t### ODEs\n\todes = {}\n");
    for ode in &model.odes {
        let rhs = match &ode.flux_formula {
            Some(flux_formula) => stringify(flux_formula, &references).to_string(),
            None => quote(&ode.formula),
        };
        out.push_str(&comment(&species_label(def, &ode.species_id)?));
        out.push_str(&format!("\todes[{}] = {}\n", quote(&ode.species_id), rhs));
    }
    out.push_str("\n\tmodule_dict['odes'] = odes");

    Ok(())
}

fn write_algebraic_equations(
    out: &mut String,
    def: &ModelDefinition,
    equations: &BTreeMap<String, String>,
) -> Result<(), CompileError> {
    out.push_str("\n\n\t### Algebraic Equations\n\talg_eqs = {}\n");
    for species_id in &def.species {
        if let Some(equation) = equations.get(species_id) {
            out.push_str(&comment(&species_label(def, species_id)?));
            out.push_str(&format!(
                "\talg_eqs[{}] = {}\n",
                quote(species_id),
                quote(equation)
            ));
        }
    }
    out.push_str("\n\tmodule_dict['alg_eqs'] = alg_eqs");

    Ok(())
}

/// A comment line; line breaks in the text are flattened to spaces.
fn comment(text: &str) -> String {
    format!("\t# {}\n", text.replace(['\r', '\n'], " "))
}

/// Comment text of a reaction: its name if names are given, else its id.
fn reaction_label<'a>(
    def: &'a ModelDefinition,
    reaction_id: &'a str,
) -> Result<&'a str, CompileError> {
    lookup_label(&def.reaction_names, reaction_id, "reaction_names")
}

/// Comment text of a species: its name if names are given, else its id.
fn species_label<'a>(
    def: &'a ModelDefinition,
    species_id: &'a str,
) -> Result<&'a str, CompileError> {
    lookup_label(&def.species_names, species_id, "species_names")
}

fn lookup_label<'a>(
    names: &'a Option<BTreeMap<String, String>>,
    id: &'a str,
    mapping: &str,
) -> Result<&'a str, CompileError> {
    match names {
        None => Ok(id),
        Some(names) => names
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| CompileError::UnresolvedReference {
                id: id.to_string(),
                mapping: mapping.to_string(),
            }),
    }
}

fn string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| quote(item)).collect();
    format!("[{}]", quoted.join(CONTINUATION))
}

fn string_dict(entries: &BTreeMap<String, String>) -> String {
    let entries = entries
        .iter()
        .map(|(key, value)| (quote(key), quote(value)))
        .collect();
    python_dict(entries, CONTINUATION)
}

fn python_dict(entries: Vec<(String, String)>, separator: &str) -> String {
    let rendered: Vec<String> = entries
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    format!("{{{}}}", rendered.join(separator))
}

/// Python float literal of a value.
fn python_float(value: f64) -> String {
    if value.is_nan() {
        "float('nan')".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}float('inf')", sign)
    } else {
        format_number(value)
    }
}
