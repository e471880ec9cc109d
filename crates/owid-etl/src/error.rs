//! Error types for the owid-etl library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations.
///
/// Integrity variants (unknown entity, duplicate datapoints, out-of-range
/// estimates, ...) mean the input data violates an assumption the outputs
/// depend on. They are never recovered from: the run stops.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a value in tabular data.
    #[error("Parse error at row {row}, column '{column}': {message}")]
    Parse {
        row: usize,
        column: String,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading an xlsx workbook.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// Network failure that could not be recovered by resuming.
    #[error("HTTP error for '{url}': {message}")]
    Http { url: String, message: String },

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A required column is absent from a table.
    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An entity code has no entry in the standardized names table.
    #[error("Unknown entity code '{code}': not present in the standardized entity names")]
    UnknownEntity { code: String },

    /// The same (entity, year) pair appeared twice in one variable.
    #[error("Duplicate datapoint for variable '{variable}': ({entity}, {year})")]
    DuplicateDatapoint {
        variable: String,
        entity: String,
        year: i32,
    },

    /// Two variables mapped to the same partition file.
    #[error("Partition '{path}' already exists; each variable must map to its own file")]
    DuplicatePartition { path: PathBuf },

    /// A value that must be numeric could not be read as a number.
    #[error("Non-numeric value '{value}' for variable '{variable}' ({entity}, {column})")]
    NonNumeric {
        variable: String,
        entity: String,
        column: String,
        value: String,
    },

    /// A null slipped into an output that must be complete.
    #[error("Null value in {0}")]
    NullValue(String),

    /// Estimated share of population outside the sanity bounds.
    #[error("Estimated share {share} for '{code}' is outside [{min}, {max}]")]
    ShareOutOfRange {
        code: String,
        share: f64,
        min: f64,
        max: f64,
    },

    /// The datasets summary did not contain exactly one row.
    #[error("Expected exactly one dataset summary row, found {0}")]
    DatasetSummary(usize),
}

impl EtlError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors that signal an input data or manifest
    /// invariant violation rather than an environment problem.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            EtlError::UnknownEntity { .. }
                | EtlError::DuplicateDatapoint { .. }
                | EtlError::DuplicatePartition { .. }
                | EtlError::NonNumeric { .. }
                | EtlError::NullValue(_)
                | EtlError::ShareOutOfRange { .. }
                | EtlError::DatasetSummary(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EtlError>;
