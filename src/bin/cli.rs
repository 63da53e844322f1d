//! Command-line interface for the odegen library
//!
//! This binary provides a CLI interface to compile reaction network definitions, including:
//! - Compiling definitions into Python and C modules
//! - Validating definitions and computing their fingerprints
//! - Translating single formulas between dialects
//! - Cleaning up files generated by the C solver build
//!
//! # Usage
//!
//! ```bash
//! # Compile a definition into a Python module
//! odegen compile --path model.json
//!
//! # Compile into both dialects, cleaning formulas first
//! odegen compile --path model.json --target all --clean-formulas
//!
//! # Translate a formula to MATLAB syntax
//! odegen translate --to matlab "pow(A, k3) * B"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use odegen::{
    cleanup::remove_model_files,
    compile::{compile, CompileOptionsBuilder},
    dialect::{clean_formula, conv_to_cstr, math_to_matlab},
    emit::Dialect,
    expression::Expression,
    fingerprint::fingerprint,
    io::{load_model, save_compiled},
    validation::consistency::check_consistency,
};

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Compile a model definition into source modules
    Compile {
        /// Path to the JSON model definition
        #[arg(short, long)]
        path: PathBuf,

        /// Dialect(s) to emit
        #[arg(short, long, value_enum, default_value_t = Target::Python)]
        target: Target,

        /// Docstring of the generated Python function
        #[arg(short, long, default_value = "")]
        doc: String,

        /// Normalize rates and equations before embedding them
        #[arg(long)]
        clean_formulas: bool,

        /// Output directory for Python modules
        #[arg(long, default_value = "python_models")]
        python_dir: PathBuf,

        /// Output directory for C modules
        #[arg(long, default_value = "c_models")]
        c_dir: PathBuf,

        /// Also save the compiled model as JSON
        #[arg(long)]
        save_compiled: Option<PathBuf>,
    },
    /// Check the consistency of a model definition
    Validate {
        /// Path to the JSON model definition
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Print the structural fingerprint of a model definition
    Fingerprint {
        /// Path to the JSON model definition
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Translate formulas between dialects
    Translate {
        /// Target dialect
        #[arg(long, value_enum)]
        to: TranslateTo,

        /// Formulas to translate
        #[arg(required = true)]
        formulas: Vec<String>,
    },
    /// Remove files generated by the C solver build
    Clean {
        /// Directory containing `bin/`, `includes/` and `src/`
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

/// Dialects the compile command can emit
#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Python,
    C,
    All,
}

impl Target {
    fn dialects(&self) -> Vec<Dialect> {
        match self {
            Target::Python => vec![Dialect::Python],
            Target::C => vec![Dialect::C],
            Target::All => vec![Dialect::Python, Dialect::C],
        }
    }
}

/// Formula dialects of the translate command
#[derive(Clone, Copy, ValueEnum)]
enum TranslateTo {
    /// Normalized spacing and numeric literals
    Clean,
    /// C expressions
    C,
    /// MATLAB power syntax
    Matlab,
}

/// Main entry point for the CLI application
pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let cli = Cli::parse();

    match run(&cli.command) {
        Ok(code) => code,
        Err(err) => {
            println!("{} {}", "Error:".bold().red(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Compile {
            path,
            target,
            doc,
            clean_formulas,
            python_dir,
            c_dir,
            save_compiled: compiled_path,
        } => {
            let model = load_model(path)?;
            let options = CompileOptionsBuilder::default()
                .clean_formulas(*clean_formulas)
                .doc(doc.as_str())
                .python_dir(python_dir.clone())
                .c_dir(c_dir.clone())
                .build()?;

            let compiled = compile(&model, &options)?;
            let writer = options.writer();
            for dialect in target.dialects() {
                let module = compiled.render(dialect, &options)?;
                writer.write(&module)?;
            }

            if let Some(compiled_path) = compiled_path {
                save_compiled(compiled_path, &compiled)?;
                log::info!("Saved compiled model to {}", compiled_path.display());
            }
        }
        Commands::Validate { path } => {
            let model = load_model(path)?;
            let report = check_consistency(&model);
            for result in &report.errors {
                println!("{}", result);
            }

            if !report.is_valid {
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", "Model definition is consistent".bold().green());
        }
        Commands::Fingerprint { path } => {
            let model = load_model(path)?;
            println!("{:016x}", fingerprint(&model));
        }
        Commands::Translate { to, formulas } => {
            let translated: Vec<String> = match to {
                TranslateTo::Clean => formulas.iter().map(|f| clean_formula(f)).collect(),
                TranslateTo::Matlab => formulas.iter().map(|f| math_to_matlab(f)).collect(),
                TranslateTo::C => {
                    let expressions = formulas
                        .iter()
                        .map(|f| Expression::parse(f))
                        .collect::<Result<Vec<_>, _>>()?;
                    conv_to_cstr(&expressions)?
                }
            };

            for formula in translated {
                println!("{}", formula);
            }
        }
        Commands::Clean { root } => {
            remove_model_files(root)?;
            log::info!("Removed generated model files below {}", root.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
