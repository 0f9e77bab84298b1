//! Error handling for the Stencil application.
//! Defines the error type and result alias used throughout the crate.

use thiserror::Error;

/// Error types for Stencil operations.
///
/// Configuration and structural variants are raised before anything is written
/// to the output directory. Post-processor failures never surface here; they
/// are recorded in [`crate::engine::ScaffoldResult`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    /// Represents errors while walking a template tree
    #[error("Template walk error: {0}.")]
    WalkDirError(#[from] walkdir::Error),

    #[error("Template error: {0}.")]
    TemplateError(String),

    #[error("Template rendering error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents errors in processing .stencilignore files
    #[error("Ignore file error: {0}.")]
    IgnoreError(String),

    /// A requested or required module ID is not in the registry.
    #[error("Unknown module '{id}'{}.", .required_by.as_ref().map(|by| format!(" (required by '{by}')")).unwrap_or_default())]
    UnknownModule { id: String, required_by: Option<String> },

    #[error("Module '{id}' is already registered.")]
    DuplicateModule { id: String },

    /// A manifest failed structural validation at the plugin boundary.
    #[error("Invalid module manifest '{source_label}': field '{field}' {reason}.")]
    InvalidManifest { source_label: String, field: String, reason: String },

    #[error("Cyclic module dependency: {}.", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Two version constraints for one package cannot be ordered numerically.
    #[error("Cannot compare versions '{left}' and '{right}' for package '{package}'.")]
    IncomparableVersions { package: String, left: String, right: String },

    #[error("Output path '{path}' is invalid.")]
    InvalidOutputPath { path: String },

    #[error("Prompt error: {0}.")]
    PromptError(#[from] dialoguer::Error),
}

/// Convenience type alias for Results with Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
