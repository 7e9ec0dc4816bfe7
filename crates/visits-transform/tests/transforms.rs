//! Properties and scenarios for the transform chain.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use visits_model::{Column, Dataset, EtlConfig, IncrementalConfig, RawVisit, VisitRecord};
use visits_transform::{
    dedupe_latest, filter_since_watermark, stage, validate_required,
};

// ============================================================================
// Generators
// ============================================================================

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn arb_record() -> impl Strategy<Value = VisitRecord> {
    (
        proptest::option::of(0u8..6),
        proptest::option::of(0u8..4),
        proptest::option::of(0i64..20 * 24),
        proptest::option::of(0.0f64..500.0),
    )
        .prop_map(|(visit, patient, hours, cost)| VisitRecord {
            visit_id: visit.map(|v| format!("V{v}")),
            patient_id: patient.map(|p| format!("P{p}")),
            last_updated: hours.map(|h| base_time() + Duration::hours(h)),
            visit_cost: cost,
            ..VisitRecord::default()
        })
}

fn arb_dataset() -> impl Strategy<Value = Dataset> {
    proptest::collection::vec(arb_record(), 0..40).prop_map(Dataset::new)
}

fn etl() -> EtlConfig {
    EtlConfig {
        required_columns: vec![Column::VisitId, Column::PatientId],
        dedupe_key: Column::VisitId,
        dedupe_order_by: Column::LastUpdated,
        watermark_column: Column::LastUpdated,
        incremental: IncrementalConfig {
            enabled: true,
            lookback_hours: 24,
        },
    }
}

fn raw(id: &str, patient: &str, updated: &str) -> RawVisit {
    RawVisit {
        visit_id: Some(id.into()),
        patient_id: Some(patient.into()),
        provider_id: Some("D1".into()),
        diagnosis_code: Some("J10".into()),
        visit_date: Some("2024-01-05".into()),
        visit_cost: Some("100".into()),
        last_updated: Some(updated.into()),
        extra: BTreeMap::new(),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn partition_is_total_and_disjoint(dataset in arb_dataset()) {
        let required = [Column::VisitId, Column::PatientId];
        let input = dataset.clone();
        let partition = validate_required(dataset, &required);

        prop_assert_eq!(partition.accepted.len() + partition.rejected.len(), input.len());
        for record in &partition.accepted {
            prop_assert!(record.visit_id.is_some() && record.patient_id.is_some());
        }
        for record in &partition.rejected {
            prop_assert!(record.visit_id.is_none() || record.patient_id.is_none());
        }
    }

    #[test]
    fn dedupe_keeps_unique_keys_with_latest_value(dataset in arb_dataset()) {
        let mut latest: BTreeMap<Option<String>, Option<DateTime<Utc>>> = BTreeMap::new();
        for record in &dataset {
            let entry = latest.entry(record.visit_id.clone()).or_insert(record.last_updated);
            if record.last_updated > *entry {
                *entry = record.last_updated;
            }
        }

        let output = dedupe_latest(dataset, Column::VisitId, Column::LastUpdated);

        let keys: BTreeSet<_> = output.iter().map(|r| r.visit_id.clone()).collect();
        prop_assert_eq!(keys.len(), output.len());
        prop_assert_eq!(keys.len(), latest.len());
        for record in &output {
            prop_assert_eq!(record.last_updated, latest[&record.visit_id]);
        }
    }

    #[test]
    fn watermark_filter_is_idempotent(
        dataset in arb_dataset(),
        offset_hours in 0i64..20 * 24,
        lookback in 0u32..72,
    ) {
        let watermark = Some(base_time() + Duration::hours(offset_hours));
        let once = filter_since_watermark(dataset, Column::LastUpdated, watermark, lookback);
        let twice = filter_since_watermark(once.clone(), Column::LastUpdated, watermark, lookback);
        prop_assert_eq!(once, twice);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn latest_update_survives_dedupe() {
    let rows = vec![
        raw("V1", "P-early", "2024-01-05T10:00:00Z"),
        raw("V1", "P-late", "2024-01-06T10:00:00Z"),
    ];
    let mut config = etl();
    config.incremental.enabled = false;

    let staged = stage(rows, &config, None);

    assert_eq!(staged.accepted.len(), 1);
    assert_eq!(staged.duplicates_dropped, 1);
    assert_eq!(
        staged.accepted.records()[0].patient_id.as_deref(),
        Some("P-late")
    );
}

#[test]
fn lookback_window_excludes_rows_before_cutoff() {
    let rows = vec![
        raw("V1", "P1", "2024-01-08T23:59:59Z"),
        raw("V2", "P2", "2024-01-09T00:00:00Z"),
        raw("V3", "P3", "2024-01-11T08:00:00Z"),
        RawVisit {
            last_updated: Some("not a timestamp".into()),
            ..raw("V4", "P4", "")
        },
    ];
    let watermark = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).single();

    let staged = stage(rows, &etl(), watermark);

    let ids: Vec<_> = staged
        .screened
        .iter()
        .filter_map(|r| r.visit_id.as_deref())
        .collect();
    assert_eq!(ids, vec!["V2", "V3"]);
    assert_eq!(staged.filtered_out(), 2);
    assert_eq!(staged.accepted.len(), 2);
}

#[test]
fn rejected_rows_keep_input_order() {
    let rows = vec![
        RawVisit {
            patient_id: None,
            ..raw("V1", "", "2024-01-05T10:00:00Z")
        },
        raw("V2", "P2", "2024-01-05T10:00:00Z"),
        RawVisit {
            visit_id: None,
            ..raw("", "P3", "2024-01-05T10:00:00Z")
        },
    ];
    let mut config = etl();
    config.incremental.enabled = false;

    let staged = stage(rows, &config, None);

    assert_eq!(staged.screened.len(), 3);
    assert_eq!(staged.accepted.len(), 1);
    let rejected_patients: Vec<_> = staged
        .rejected
        .iter()
        .map(|r| r.patient_id.as_deref())
        .collect();
    assert_eq!(rejected_patients, vec![None, Some("P3")]);
}
