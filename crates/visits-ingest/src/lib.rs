//! Visit data ingestion.
//!
//! - **CSV loading**: read the source file into a [`CsvTable`]
//! - **Raw snapshots**: copy each input into an immutable, timestamped file
//! - **Schema check**: convert the table to [`visits_model::RawVisit`] rows
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use visits_ingest::{extract_to_raw, raw_visits};
//!
//! let snapshot = extract_to_raw(Path::new("data/input/patient_visits.csv"), Path::new("data/raw"))?;
//! let rows = raw_visits(&snapshot.table)?;
//! ```

mod csv_table;
mod error;
mod records;
mod snapshot;

pub use csv_table::{CsvTable, csv_bytes, read_csv_table};
pub use error::{IngestError, Result};
pub use records::raw_visits;
pub use snapshot::{
    RawSnapshot, extract_to_raw, extract_to_raw_at, snapshot_file_name, utc_compact,
};
