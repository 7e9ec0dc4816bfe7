//! Immutable raw snapshots of the source file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::info;
use visits_common::write_new_file;

use crate::csv_table::{CsvTable, csv_bytes, read_csv_table};
use crate::error::{IngestError, Result};

const SNAPSHOT_PREFIX: &str = "patient_visits_raw";

/// A snapshot written by [`extract_to_raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    pub path: PathBuf,
    pub rows: usize,
    /// Hex SHA-256 of the snapshot file contents.
    pub sha256: String,
    pub table: CsvTable,
}

/// Compact UTC timestamp used in snapshot names, e.g. `20240110T081500Z`.
pub fn utc_compact(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn snapshot_file_name(at: DateTime<Utc>) -> String {
    format!("{SNAPSHOT_PREFIX}_{}.csv", utc_compact(at))
}

/// Read `input_csv` and write it as a new, never-overwritten snapshot in `raw_dir`.
pub fn extract_to_raw(input_csv: &Path, raw_dir: &Path) -> Result<RawSnapshot> {
    extract_to_raw_at(input_csv, raw_dir, Utc::now())
}

/// [`extract_to_raw`] with an explicit snapshot time.
pub fn extract_to_raw_at(
    input_csv: &Path,
    raw_dir: &Path,
    at: DateTime<Utc>,
) -> Result<RawSnapshot> {
    let table = read_csv_table(input_csv)?;
    fs::create_dir_all(raw_dir).map_err(|source| IngestError::CreateDir {
        path: raw_dir.to_path_buf(),
        source,
    })?;
    let bytes = csv_bytes(&table).map_err(|source| IngestError::CsvParse {
        path: input_csv.to_path_buf(),
        source,
    })?;
    let path = write_new_file(raw_dir, &snapshot_file_name(at), &bytes)?;
    let sha256 = hex::encode(Sha256::digest(&bytes));
    let rows = table.rows.len();
    info!(
        read_rows = rows,
        raw_written = %path.display(),
        sha256 = %sha256,
        "raw snapshot written"
    );
    Ok(RawSnapshot {
        path,
        rows,
        sha256,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_name_uses_compact_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 15, 0).unwrap();
        assert_eq!(
            snapshot_file_name(at),
            "patient_visits_raw_20240110T081500Z.csv"
        );
    }
}
