use std::path::PathBuf;

use thiserror::Error;
use visits_common::WriteError;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize quality report")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed quality report: {path}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<WriteError> for QualityError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Io {
                operation,
                path,
                source,
            } => QualityError::Io {
                operation,
                path,
                source,
            },
            WriteError::Rename {
                target_path,
                source,
                ..
            } => QualityError::Io {
                operation: "replace",
                path: target_path,
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, QualityError>;
