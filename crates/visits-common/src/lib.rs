//! Shared utilities for the visits ETL crates.

pub mod fs;

pub use fs::{WriteError, replace_file, write_new_file};
