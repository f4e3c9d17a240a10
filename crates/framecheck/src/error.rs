//! Error types for the framecheck library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for framecheck operations.
#[derive(Debug, Error)]
pub enum FrameCheckError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty file or no data to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// File extension not supported for the requested operation.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A referenced column does not exist.
    #[error("Column '{column}' not found")]
    ColumnNotFound { column: String },

    /// A referenced custom rule does not exist.
    #[error("Rule '{name}' not found")]
    RuleNotFound { name: String },

    /// A persisted file could not be interpreted.
    #[error("Parse error in '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// A value-range literal could not be parsed.
    #[error("Invalid value literal: {0}")]
    Literal(String),

    /// A column could not be cast to its declared type.
    #[error("Cannot cast value '{value}' in column '{column}' to {target}")]
    TypeCoercion {
        column: String,
        value: String,
        target: String,
    },

    /// A custom rule query could not be parsed or evaluated.
    #[error("Invalid query for rule '{rule}': {message}")]
    InvalidQuery { rule: String, message: String },

    /// A table was constructed with inconsistent columns.
    #[error("Invalid table: {0}")]
    InvalidTable(String),
}

impl FrameCheckError {
    /// Wrap an IO error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FrameCheckError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for a persisted file.
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        FrameCheckError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a lookup error for a missing column.
    pub(crate) fn column_not_found(column: impl Into<String>) -> Self {
        FrameCheckError::ColumnNotFound {
            column: column.into(),
        }
    }
}

/// Result type alias for framecheck operations.
pub type Result<T> = std::result::Result<T, FrameCheckError>;
