//! Error types for the classification pipeline
//!
//! Every error is unrecoverable at the point of occurrence and aborts the
//! current run; messages name the failing stage and the offending entity
//! (file path, dataset name, classifier name).

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input record (wrong token count or non-numeric token)
    #[error("malformed record at {path}:{line}: {message}")]
    Format {
        /// Input file being parsed
        path: String,
        /// 1-based line number of the offending record
        line: usize,
        /// What was wrong with the record
        message: String,
    },

    /// Requested named dataset missing from the container
    #[error("dataset '{table}' not found in container {path}")]
    NotFound {
        /// Requested table name
        table: String,
        /// Container file path
        path: String,
    },

    /// Variable-name mismatch between stored data and caller expectation
    #[error("schema mismatch in {context}: expected [{expected}], found [{found}]")]
    Schema {
        /// Where the mismatch was detected (container path or dataset name)
        context: String,
        /// Caller's expected variable list
        expected: String,
        /// What was actually present
        found: String,
    },

    /// Invalid experiment configuration (duplicate classifier name, unknown
    /// variable reference, unknown hyperparameter key)
    #[error("invalid experiment config: {0}")]
    Config(String),

    /// External training collaborator rejected hyperparameters or data
    #[error("training failed for classifier '{classifier}': {message}")]
    Training {
        /// Name of the offending classifier spec
        classifier: String,
        /// Collaborator's failure reason
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Result-artifact serialization error
    #[error("artifact serialization error: {0}")]
    Artifact(#[from] serde_json::Error),
}
