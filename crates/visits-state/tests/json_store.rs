use std::fs;

use chrono::{Duration, TimeZone, Utc};

use visits_model::RunState;
use visits_state::{JsonFileStore, RunStateStore, StateError};

#[test]
fn missing_file_means_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("run_state.json"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn save_then_load_keeps_nanoseconds() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("state").join("run_state.json"));
    let watermark = Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 15).unwrap() + Duration::nanoseconds(987_654_321);
    let state = RunState::new(42, Some(watermark));

    store.save(&state).unwrap();

    assert_eq!(store.load().unwrap(), Some(state));
    assert!(!store.path().with_extension("json.tmp").exists());
}

#[test]
fn save_replaces_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("run_state.json"));
    store.save(&RunState::new(10, None)).unwrap();
    store.save(&RunState::new(12, None)).unwrap();
    assert_eq!(store.load().unwrap(), Some(RunState::new(12, None)));
}

#[test]
fn file_format_is_flat_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_state.json");
    fs::write(&path, r#"{"last_row_count": 7, "watermark": "2024-01-10T00:00:00Z"}"#).unwrap();

    let state = JsonFileStore::new(&path).load().unwrap().unwrap();

    assert_eq!(state.last_row_count, 7);
    assert_eq!(state.watermark, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).single());
}

#[test]
fn watermark_may_be_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_state.json");
    fs::write(&path, r#"{"last_row_count": 0}"#).unwrap();
    let state = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(state.watermark, None);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_state.json");
    fs::write(&path, "not json").unwrap();
    assert!(matches!(
        JsonFileStore::new(&path).load(),
        Err(StateError::Deserialization { .. })
    ));
}

#[cfg(unix)]
#[test]
fn failed_replace_keeps_target_and_reports_both_paths() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("run_state.json");
    fs::create_dir(&target).unwrap();
    let store = JsonFileStore::new(&target);

    let err = store.save(&RunState::new(1, None)).unwrap_err();

    match err {
        StateError::AtomicWriteFailed {
            temp_path,
            target_path,
            ..
        } => {
            assert_eq!(target_path, target);
            assert_eq!(temp_path, dir.path().join("run_state.json.tmp"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(target.is_dir());
}
