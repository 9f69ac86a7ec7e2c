//! Error types shared by the geochemistry pipeline crates.

use std::path::PathBuf;

use thiserror::Error;

use crate::field::SemanticField;
use crate::schema::SchemaTag;

/// Errors raised while loading, filtering, reshaping or aggregating survey data.
#[derive(Debug, Error)]
pub enum GeochemError {
    // === File System Errors ===
    /// Input file does not exist.
    #[error("input file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Dataset Errors ===
    /// File has a header row but no data rows.
    #[error("dataset has no data rows: {path}")]
    EmptyDataset { path: PathBuf },

    /// Filtering left nothing to reshape or aggregate.
    #[error("no rows matched the requested filters for {command}")]
    NoMatchingData { command: String },

    /// CSV could not be parsed.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Schema Errors ===
    /// A semantic field has no column mapping for the active schema.
    #[error("no column mapping for field '{field}' in schema '{schema}'")]
    SchemaMapping {
        field: SemanticField,
        schema: SchemaTag,
    },

    /// The mapped header is not present in the file.
    #[error("column '{column}' (field '{field}') not found in {path}")]
    MissingColumn {
        field: SemanticField,
        column: String,
        path: PathBuf,
    },

    // === Pipeline Errors ===
    /// Two readings for one cell could not be ordered.
    #[error("cannot resolve competing values for sample '{sample_id}', element '{element}'")]
    ReshapeConflict { sample_id: String, element: String },

    /// Depth interval must be a positive number of metres.
    #[error("interval size must be a positive integer, got {interval}")]
    InvalidInterval { interval: i64 },

    // === Configuration Errors ===
    /// User configuration could not be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl GeochemError {
    /// Map an I/O error on `path` to `FileNotFound` or `FileRead`.
    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source }
        }
    }

    /// Wrap a CSV reader error with the file it came from.
    pub fn csv(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::CsvParse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, GeochemError>;
