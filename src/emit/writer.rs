use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tempfile::NamedTempFile;

use crate::emit::module::{Dialect, GeneratedModule};
use crate::error::CompileError;

/// Writes generated modules into per-dialect output directories.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleWriter {
    python_dir: PathBuf,
    c_dir: PathBuf,
}

impl Default for ModuleWriter {
    fn default() -> Self {
        Self::new(Dialect::Python.default_dir(), Dialect::C.default_dir())
    }
}

impl ModuleWriter {
    pub fn new(python_dir: impl Into<PathBuf>, c_dir: impl Into<PathBuf>) -> Self {
        Self {
            python_dir: python_dir.into(),
            c_dir: c_dir.into(),
        }
    }

    /// Output directory for a dialect.
    pub fn dir(&self, dialect: Dialect) -> &Path {
        match dialect {
            Dialect::Python => &self.python_dir,
            Dialect::C => &self.c_dir,
        }
    }

    /// Path the module will be written to.
    pub fn path_for(&self, module: &GeneratedModule) -> PathBuf {
        self.dir(module.dialect).join(module.file_name())
    }

    /// Writes a module, replacing any previous file of the same name.
    ///
    /// The text goes to a uniquely named temporary file in the output
    /// directory first and is then renamed into place, so the target is
    /// either the old or a new module, never a partial one, even with
    /// concurrent writers. Diagnostics and a completion message are printed
    /// to stdout.
    ///
    /// # Arguments
    ///
    /// * `module` - The rendered module
    ///
    /// # Returns
    ///
    /// * `Result<PathBuf, CompileError>` - Path of the written module
    pub fn write(&self, module: &GeneratedModule) -> Result<PathBuf, CompileError> {
        let dir = self.dir(module.dialect);
        fs::create_dir_all(dir)?;

        let path = self.path_for(module);

        // Dropping the temporary file on an error path removes it
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(module.source.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|err| err.error)?;

        for diagnostic in &module.diagnostics {
            log::warn!("{}: {}", module.name, diagnostic);
            println!("\n{}", diagnostic.to_string().yellow());
        }

        log::debug!("Wrote {}", path.display());
        println!(
            "\n {} module \"{}\" successfully written!",
            module.dialect,
            module.name.bold()
        );

        Ok(path)
    }
}
