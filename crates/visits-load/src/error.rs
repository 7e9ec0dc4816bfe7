use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    // =========================================================================
    // Staging artifacts
    // =========================================================================
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build staging frame")]
    Frame {
        #[source]
        source: PolarsError,
    },

    #[error("failed to write CSV artifact {path}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    // =========================================================================
    // Warehouse
    // =========================================================================
    #[error("failed to open warehouse {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("warehouse {operation} failed")]
    Sql {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("malformed {column} value in warehouse: {value}")]
    InvalidStoredValue { column: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Map a SQLite error to [`LoadError::Sql`] for the named operation.
pub(crate) fn sql(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> LoadError {
    move |source| LoadError::Sql { operation, source }
}
