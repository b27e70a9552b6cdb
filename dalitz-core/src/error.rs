//! Error types for dalitz-core.

use thiserror::Error;

/// Result type alias for dalitz operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to read a named scalar field from an event record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldAccessError {
    /// The record has no field with this name.
    #[error("missing field '{name}'")]
    Missing { name: String },

    /// The field exists but does not hold a finite number.
    #[error("malformed field '{name}': {value}")]
    Malformed { name: String, value: f64 },
}

impl FieldAccessError {
    /// Name of the offending field.
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::Missing { name } | Self::Malformed { name, .. } => name,
        }
    }
}

/// Core error types for dalitz operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A record field could not be read.
    #[error("event {index}: {source}")]
    FieldAccess {
        index: usize,
        #[source]
        source: FieldAccessError,
    },

    /// No event passed the acceptance window, so there is nothing to hand off.
    #[error("no events passed the kinematic selection; refusing to build an empty feature matrix")]
    EmptyResult,

    /// Columns of an in-memory event table have different lengths.
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A record index past the end of the source was requested.
    #[error("record {index} out of range (source has {len} records)")]
    RecordOutOfRange { index: usize, len: usize },

    /// The underlying event source failed.
    #[error("event source error: {0}")]
    Source(String),
}
