//! Error types for the balrecon pipeline.
//!
//! Every fallible operation in the library crates returns [`Result`], which
//! carries a [`ReconError`]. Parse failures name the snapshot, the column and
//! the offending value so the caller can surface them to the user as-is.

use crate::types::SnapshotSide;
use thiserror::Error;

/// The main error type for balrecon operations.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Failure reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A required column is absent from a snapshot export.
    #[error("{snapshot} snapshot is missing required column: {column}")]
    MissingColumn {
        /// Which snapshot was being read.
        snapshot: SnapshotSide,
        /// Header name that was expected.
        column: String,
    },

    /// A cell could not be coerced to the column's type.
    #[error("{snapshot} snapshot, row {row}: cannot read {column} value {value:?} as a number")]
    InvalidValue {
        /// Which snapshot was being read.
        snapshot: SnapshotSide,
        /// Header name of the column.
        column: String,
        /// 1-based data row (header excluded).
        row: usize,
        /// Raw cell text.
        value: String,
    },

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A date is malformed or out of range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Configuration rejected by validation or unreadable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failure serializing a report.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for ReconError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ReconError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for balrecon operations.
pub type Result<T> = std::result::Result<T, ReconError>;
