//! Error types for the tfusers core library.
//!
//! Each stage of the conversion has its own error type derived with
//! `thiserror`, and a top-level [`CoreError`] enum unifies them for callers
//! that want a single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Tabular input errors
// ---------------------------------------------------------------------------

/// Errors from reading the directory export.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The input path does not exist or could not be opened.
    #[error("input file '{path}' could not be opened: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The content violates delimited-text syntax.
    #[error("malformed CSV input (line {line}): {detail}")]
    Format {
        line: u64,
        detail: String,
    },

    /// The file holds no rows at all, not even a header.
    #[error("no records found in CSV input")]
    EmptyInput,
}

// ---------------------------------------------------------------------------
// Variable file errors
// ---------------------------------------------------------------------------

/// Errors from rendering or writing the Terraform variables file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The mapping could not be rendered, or a rendered file could not be
    /// parsed back.
    #[error("variables serialization failed: {0}")]
    Serialization(String),

    /// The variable name cannot be used as an HCL identifier.
    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),

    /// The output file could not be created, written, or moved into place.
    #[error("failed to write variables file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
