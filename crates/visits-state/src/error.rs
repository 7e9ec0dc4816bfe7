//! Run state error types.

use std::path::PathBuf;

use thiserror::Error;
use visits_common::WriteError;

#[derive(Debug, Error)]
pub enum StateError {
    /// File I/O error.
    #[error("failed to {operation} run state file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize run state")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// The file exists but is not a run state document.
    #[error("malformed run state file: {path}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Temp file was written but could not replace the target.
    #[error("failed to replace run state file {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<WriteError> for StateError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Io {
                operation,
                path,
                source,
            } => StateError::Io {
                operation,
                path,
                source,
            },
            WriteError::Rename {
                temp_path,
                target_path,
                source,
            } => StateError::AtomicWriteFailed {
                temp_path,
                target_path,
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
