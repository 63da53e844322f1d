//! C module emitter.
//!
//! Produces a translation unit for a CVODE style driver: sizes and initial
//! values as `#define`s, an `initial_values` function filling the state and
//! parameter vectors, and the `rhs` callback.

use std::collections::HashMap;

use crate::compile::CompiledModel;
use crate::emit::module::{Diagnostic, Dialect, GeneratedModule};
use crate::error::CompileError;
use crate::expression::{c_number, CPrinter, Expression};

/// Renders a compiled model as a C module.
///
/// Dynamic species are read from the state vector (`NV_Ith_S(y, i)`),
/// parameters from `p[j]` and all remaining species from the constant array
/// `c[k]`. Algebraic equations are not emitted and only reported as a
/// diagnostic.
///
/// # Errors
///
/// Fails with `UnsupportedExpression` if a right-hand side has no C
/// rendering and with `UnresolvedReference` if it uses an unknown symbol.
pub fn render_c_module(model: &CompiledModel) -> Result<GeneratedModule, CompileError> {
    let def = &model.definition;
    let mut diagnostics = Vec::new();

    let dynamic = model.dynamic_species();
    let constant: Vec<&str> = def
        .species
        .iter()
        .map(String::as_str)
        .filter(|id| !dynamic.contains(id))
        .collect();

    if let Some(equations) = &def.algebraic_equations {
        let species: Vec<String> = def
            .species
            .iter()
            .filter(|id| equations.contains_key(*id))
            .cloned()
            .collect();
        if !species.is_empty() {
            diagnostics.push(Diagnostic::AlgebraicEquationsSkipped { species });
        }
    }

    let printer = CPrinter::with_symbols(symbol_table(model, &dynamic, &constant));

    let mut out = String::new();
    out.push_str(&format!("/* Model: {} */\n", def.name));
    out.push_str(&format!("/* Fingerprint: {:016x} */\n\n", model.fingerprint));
    out.push_str("#include <math.h>\n");
    out.push_str("#include <nvector/nvector_serial.h>\n");
    out.push_str("#include <sundials/sundials_types.h>\n\n");

    out.push_str(&define("NEQ", &dynamic.len().to_string(), "number of equations"));
    out.push_str(&define("NPAR", &def.parameters.len().to_string(), "number of parameters"));

    out.push_str("\n/* initial values of the dynamic species */\n");
    for (i, species_id) in dynamic.iter().enumerate() {
        let value = rconst(def.initial_species_value(species_id));
        out.push_str(&define(&format!("X{}", i + 1), &value, species_id));
    }

    out.push_str("\n/* initial values of the parameters */\n");
    for (j, parameter_id) in def.parameters.iter().enumerate() {
        let value = rconst(def.initial_parameter_value(parameter_id));
        out.push_str(&define(&format!("P{}", j + 1), &value, parameter_id));
    }

    if !constant.is_empty() {
        out.push_str("\n/* species held constant */\n");
        out.push_str(&format!("static const realtype c[{}] = {{\n", constant.len()));
        for species_id in &constant {
            out.push_str(&format!(
                "  {}, /* {} */\n",
                rconst(def.initial_species_value(species_id)),
                species_id
            ));
        }
        out.push_str("};\n");
    }

    out.push_str("\nvoid initial_values(N_Vector y, realtype *p)\n{\n");
    for i in 0..dynamic.len() {
        out.push_str(&format!("  NV_Ith_S(y, {}) = X{};\n", i, i + 1));
    }
    for j in 0..def.parameters.len() {
        out.push_str(&format!("  p[{}] = P{};\n", j, j + 1));
    }
    out.push_str("}\n");

    out.push_str("\nint rhs(realtype t, N_Vector y, N_Vector ydot, void *user_data)\n{\n");
    out.push_str("  realtype *p = (realtype *) user_data;\n\n");
    for (i, ode) in model.odes.iter().enumerate() {
        let expr = Expression::parse(&ode.formula)?;
        let printed = printer.print(&expr)?;

        out.push_str(&format!("  /* {} */\n", ode.species_id));
        // Comment lines of unsupported functions precede the code line.
        let mut lines: Vec<&str> = printed.lines().collect();
        let code = lines.pop().unwrap_or_default();
        for comment in lines {
            out.push_str(&format!("  {}\n", comment));
        }
        out.push_str(&format!("  NV_Ith_S(ydot, {}) = {};\n", i, code));
    }
    out.push_str("\n  return 0;\n}\n");

    Ok(GeneratedModule {
        name: model.name.clone(),
        dialect: Dialect::C,
        source: out,
        diagnostics,
    })
}

fn symbol_table(
    model: &CompiledModel,
    dynamic: &[&str],
    constant: &[&str],
) -> HashMap<String, String> {
    let mut symbols = HashMap::new();
    for (i, species_id) in dynamic.iter().enumerate() {
        symbols.insert(species_id.to_string(), format!("NV_Ith_S(y, {})", i));
    }
    for (k, species_id) in constant.iter().enumerate() {
        symbols.insert(species_id.to_string(), format!("c[{}]", k));
    }
    for (j, parameter_id) in model.definition.parameters.iter().enumerate() {
        symbols.insert(parameter_id.clone(), format!("p[{}]", j));
    }
    // Declared ids take precedence over builtins of the same name
    for (builtin, c_name) in [("t", "t"), ("time", "t"), ("pi", "M_PI"), ("e", "M_E")] {
        symbols
            .entry(builtin.to_string())
            .or_insert_with(|| c_name.to_string());
    }
    symbols
}

fn define(name: &str, value: &str, comment: &str) -> String {
    format!("#define {:<6}{:<18}/* {} */\n", name, value, comment)
}

fn rconst(value: f64) -> String {
    format!("RCONST({})", c_number(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, CompileOptions};
    use crate::model::{
        ModelDefinition, ModelDefinitionBuilder, OdeSource, ReactionBuilder,
        StoichiometricMatrixBuilder,
    };
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    /// Species `[A, B, C]` with `N = [[-1,0],[1,-1],[0,1]]`
    fn create_chain_model() -> ModelDefinition {
        ModelDefinitionBuilder::default()
            .name("Chain")
            .species(vec!["A".into(), "B".into(), "C".into()])
            .parameters(vec!["k1".into(), "k2".into()])
            .initial_species_values(BTreeMap::from([("A".to_string(), 1.0)]))
            .initial_parameter_values(BTreeMap::from([
                ("k1".to_string(), 2.0),
                ("k2".to_string(), 0.5),
            ]))
            .reactions(vec![
                ReactionBuilder::default().id("r1").rate("k1*A").build().unwrap(),
                ReactionBuilder::default().id("r2").rate("k2*B").build().unwrap(),
            ])
            .ode_source(OdeSource::Stoichiometric(
                StoichiometricMatrixBuilder::default()
                    .coefficients(vec![vec![-1.0, 0.0], vec![1.0, -1.0], vec![0.0, 1.0]])
                    .build()
                    .unwrap(),
            ))
            .build()
            .unwrap()
    }

    fn render(model: &ModelDefinition) -> Result<GeneratedModule, CompileError> {
        render_c_module(&compile(model, &CompileOptions::default())?)
    }

    #[test]
    fn test_render_chain_module() {
        let module = render(&create_chain_model()).unwrap();

        assert_eq!(module.dialect, Dialect::C);
        assert!(module.source.contains("#define NEQ   3"));
        assert!(module.source.contains("#define X1    RCONST(1.0)"));
        assert!(module.source.contains("#define X2    RCONST(0.1)"));
        assert!(module.source.contains("#define P2    RCONST(0.5)"));
        assert!(module.source.contains(concat!(
            "  /* A */\n  NV_Ith_S(ydot, 0) = -p[0] * NV_Ith_S(y, 0);\n",
            "  /* B */\n  NV_Ith_S(ydot, 1) = p[0] * NV_Ith_S(y, 0) - p[1] * NV_Ith_S(y, 1);\n",
            "  /* C */\n  NV_Ith_S(ydot, 2) = p[1] * NV_Ith_S(y, 1);\n",
        )));
        assert!(!module.source.contains("static const realtype c["));
        assert!(module.diagnostics.is_empty());
    }

    #[test]
    fn test_declared_ids_shadow_builtins() {
        let mut compiled = compile(&create_chain_model(), &CompileOptions::default()).unwrap();
        compiled.definition.parameters = vec!["e".into(), "t".into()];

        let symbols = symbol_table(&compiled, &["A", "B", "C"], &[]);
        assert_eq!(symbols["e"], "p[0]");
        assert_eq!(symbols["t"], "p[1]");
        assert_eq!(symbols["time"], "t");
        assert_eq!(symbols["pi"], "M_PI");
    }

    #[test]
    fn test_c_rhs_evaluates_like_assembled_formula() {
        let compiled = compile(&create_chain_model(), &CompileOptions::default()).unwrap();
        let module = render_c_module(&compiled).unwrap();

        let values = [("A", 0.7), ("B", 1.3), ("k1", 2.0), ("k2", 0.5)];
        let c_names = [
            ("NV_Ith_S(y, 0)", "A"),
            ("NV_Ith_S(y, 1)", "B"),
            ("p[0]", "k1"),
            ("p[1]", "k2"),
        ];

        for (i, ode) in compiled.odes.iter().enumerate() {
            let prefix = format!("  NV_Ith_S(ydot, {}) = ", i);
            let line = module
                .source
                .lines()
                .find_map(|l| l.strip_prefix(prefix.as_str()))
                .unwrap()
                .trim_end_matches(';');
            let formula = c_names
                .iter()
                .fold(line.to_string(), |acc, (c, name)| acc.replace(c, name));

            let mut ctx = meval::Context::new();
            for (name, value) in values {
                ctx.var(name, value);
            }
            let evaluate = |text: &str| {
                text.parse::<meval::Expr>()
                    .unwrap()
                    .eval_with_context(&ctx)
                    .unwrap()
            };
            assert_relative_eq!(evaluate(&formula), evaluate(&ode.formula), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_species_and_heaviside() {
        let model = ModelDefinition::from_odes(
            "Pulse",
            vec!["A".into(), "E".into()],
            vec!["k".into()],
            vec!["k*E*heaviside(t - 1)".into()],
            vec![0.0, 2.0],
            vec![1.0],
        );
        let module = render(&model).unwrap();

        assert!(module
            .source
            .contains("static const realtype c[1] = {\n  RCONST(2.0), /* E */\n};"));
        assert!(module.source.contains(concat!(
            "  /* A */\n",
            "  // Not supported in C:\n",
            "  // Heaviside\n",
            "  NV_Ith_S(ydot, 0) = p[0] * c[0] * Heaviside(t - 1.0);\n"
        )));
    }

    #[test]
    fn test_algebraic_species_are_reported() {
        let mut model = create_chain_model();
        model.algebraic_equations = Some(BTreeMap::from([(
            "C".to_string(),
            "1.0 - A - B".to_string(),
        )]));
        let module = render(&model).unwrap();

        assert_eq!(
            module.diagnostics,
            vec![Diagnostic::AlgebraicEquationsSkipped {
                species: vec!["C".to_string()]
            }]
        );
    }

    #[test]
    fn test_unsupported_function_propagates() {
        let model = ModelDefinition::from_odes(
            "Bad",
            vec!["A".into()],
            vec![],
            vec!["erf(A)".into()],
            vec![],
            vec![],
        );
        assert!(matches!(
            render(&model),
            Err(CompileError::UnsupportedExpression { .. })
        ));
    }
}
