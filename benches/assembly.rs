use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use odegen::prelude::*;
use odegen::system::derive_odes;

/// Linear chain `X0 -> X1 -> ... -> Xn` with mass action rates.
fn chain_model(n: usize) -> ModelDefinition {
    let species: Vec<String> = (0..=n).map(|i| format!("X{}", i)).collect();
    let parameters: Vec<String> = (0..n).map(|j| format!("k{}", j)).collect();
    let reactions = (0..n)
        .map(|j| {
            ReactionBuilder::default()
                .id(format!("r{}", j))
                .rate(format!("k{}*X{}", j, j))
                .build()
                .expect("Failed to build reaction")
        })
        .collect();

    let coefficients: Vec<Vec<f64>> = (0..=n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        -1.0
                    } else if i == j + 1 {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    ModelDefinitionBuilder::default()
        .name("Linear chain")
        .species(species)
        .parameters(parameters)
        .reactions(reactions)
        .ode_source(OdeSource::Stoichiometric(
            StoichiometricMatrixBuilder::default()
                .coefficients(coefficients)
                .build()
                .expect("Failed to build matrix"),
        ))
        .build()
        .expect("Failed to build model")
}

fn benchmark_assembly(c: &mut Criterion) {
    let mapk = load_model("tests/data/mapk_model.json").expect("Failed to load model");
    let chain = chain_model(200);
    let options = CompileOptions::default();

    c.bench_function("mapk_derive_odes", |b| {
        b.iter(|| {
            let _ = black_box(derive_odes(black_box(&mapk)));
        });
    });

    c.bench_function("chain_derive_odes", |b| {
        b.iter(|| {
            let _ = black_box(derive_odes(black_box(&chain)));
        });
    });

    let compiled = compile(&mapk, &options).expect("Failed to compile");

    c.bench_function("mapk_render_python", |b| {
        b.iter(|| {
            let _ = black_box(compiled.render(Dialect::Python, black_box(&options)));
        });
    });

    c.bench_function("mapk_render_c", |b| {
        b.iter(|| {
            let _ = black_box(compiled.render(Dialect::C, black_box(&options)));
        });
    });
}

criterion_group!(benches, benchmark_assembly);
criterion_main!(benches);
