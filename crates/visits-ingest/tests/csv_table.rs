use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use visits_ingest::{IngestError, extract_to_raw_at, raw_visits, read_csv_table};

fn temp_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

const SOURCE: &str = "\u{feff}visit_id,patient_id,provider_id,diagnosis_code,visit_date,visit_cost,last_updated\n\
V1,P1,D1,J10,2024-01-05,120.50,2024-01-05T10:00:00Z\n\
\n\
V2,P2,D1,,01/06/2024,abc,2024-01-06 09:30:00\n\
V3,P3\n";

#[test]
fn reads_table_skipping_blank_rows_and_padding_short_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "visits.csv", SOURCE);
    let table = read_csv_table(&path).expect("read csv");
    assert_eq!(table.headers[0], "visit_id");
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[2].len(), 7);
    assert_eq!(table.rows[2][6], "");
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_csv_table(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn empty_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "empty.csv", "\n\n");
    assert!(matches!(
        read_csv_table(&path),
        Err(IngestError::EmptyCsv { .. })
    ));
}

#[test]
fn cells_past_header_width_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "wide.csv", "a,b\n1,2,3,4\n5,6\n");
    let table = read_csv_table(&path).unwrap();
    assert_eq!(table.rows, vec![vec!["1", "2"], vec!["5", "6"]]);
}

#[cfg(unix)]
#[test]
fn unreadable_path_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_csv_table(dir.path()).unwrap_err();
    assert!(matches!(err, IngestError::FileRead { .. }), "{err:?}");
}

#[test]
fn snapshot_is_written_and_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let input = temp_file(&dir, "visits.csv", SOURCE);
    let raw_dir = dir.path().join("raw");
    let at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 15, 0).unwrap();

    let snapshot = extract_to_raw_at(&input, &raw_dir, at).expect("snapshot");

    assert_eq!(
        snapshot.path,
        raw_dir.join("patient_visits_raw_20240110T081500Z.csv")
    );
    assert_eq!(snapshot.rows, 3);
    assert_eq!(snapshot.sha256.len(), 64);
    let reread = read_csv_table(&snapshot.path).expect("reread snapshot");
    assert_eq!(reread, snapshot.table);

    let visits = raw_visits(&snapshot.table).expect("schema");
    assert_eq!(visits.len(), 3);
    assert!(visits[1].diagnosis_code.is_none());
    assert_eq!(visits[1].visit_cost.as_deref(), Some("abc"));
    assert!(visits[2].last_updated.is_none());
}

#[test]
fn second_snapshot_in_same_second_gets_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let input = temp_file(&dir, "visits.csv", SOURCE);
    let raw_dir = dir.path().join("raw");
    let at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 15, 0).unwrap();

    let first = extract_to_raw_at(&input, &raw_dir, at).unwrap();
    let second = extract_to_raw_at(&input, &raw_dir, at).unwrap();

    assert_ne!(first.path, second.path);
    assert_eq!(first.sha256, second.sha256);
}
