//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum ActorError {
    /// Invalid value in [`ActorConfig`](crate::ActorConfig).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Batch size or dimension of a tensor does not match the network.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Weight file is missing or could not be decoded.
    #[error("Failed to read weight file {path:?}: {reason}")]
    WeightFile {
        /// Path of the file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKey(String),
}
