use std::path::PathBuf;

use thiserror::Error;

use crate::compile::CompiledModel;
use crate::model::ModelDefinition;

/// Loads and parses a model definition from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the JSON file containing the model definition
///
/// # Returns
///
/// Returns a `Result` containing either:
/// * `Ok(ModelDefinition)` - The successfully parsed definition
/// * `Err(IOError)` - An error that occurred during file reading or JSON parsing
///
/// # Errors
///
/// This function will return an error if:
/// * The file cannot be found or opened (`IOError::FileNotFound`)
/// * The file contents cannot be parsed as valid JSON (`IOError::JsonParseError`)
/// * The JSON structure does not match the model definition format
pub fn load_model(path: impl Into<PathBuf>) -> Result<ModelDefinition, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(file).map_err(IOError::JsonParseError)
}

/// Saves a model definition to a JSON file.
///
/// # Arguments
///
/// * `path` - Path of the JSON file to write
/// * `model` - The definition to save
pub fn save_model(path: impl Into<PathBuf>, model: &ModelDefinition) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(file, model).map_err(IOError::JsonParseError)
}

/// Saves a compiled model, including its assembled ODEs, to a JSON file.
pub fn save_compiled(path: impl Into<PathBuf>, model: &CompiledModel) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(file, model).map_err(IOError::JsonParseError)
}

/// Loads a compiled model from a JSON file.
pub fn load_compiled(path: impl Into<PathBuf>) -> Result<CompiledModel, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(file).map_err(IOError::JsonParseError)
}

/// Represents errors that can occur during model I/O operations.
///
/// This enum encapsulates the various error conditions that may arise when reading
/// and writing model definitions as JSON.
#[derive(Error, Debug)]
pub enum IOError {
    /// Indicates that the specified file could not be found or opened.
    ///
    /// This variant wraps the underlying std::io::Error that provides more details
    /// about the specific file system error that occurred.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// Indicates that the file contents could not be parsed as valid JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, CompileOptions};
    use tempfile::tempdir;

    #[test]
    fn test_model_roundtrip() {
        let model = load_model("tests/data/chain_model.json").expect("Failed to load model");
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        save_model(&path, &model).unwrap();
        assert_eq!(load_model(&path).unwrap(), model);
    }

    #[test]
    fn test_compiled_roundtrip() {
        let model = load_model("tests/data/chain_model.json").expect("Failed to load model");
        let compiled = compile(&model, &CompileOptions::default()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("compiled.json");

        save_compiled(&path, &compiled).unwrap();
        assert_eq!(load_compiled(&path).unwrap(), compiled);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_model("tests/data/does_not_exist.json"),
            Err(IOError::FileNotFound(_))
        ));
    }
}
