//! Staging artifacts: datasets as Polars frames and CSV files.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use polars::prelude::{Column as FrameColumn, CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use tracing::info;

use visits_model::{Column, Dataset, VisitRecord};

use crate::error::{LoadError, Result};

/// Fixed-width UTC rendering, so stored timestamps sort as text.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn text_column(name: &str, dataset: &Dataset, get: impl Fn(&VisitRecord) -> Option<String>) -> FrameColumn {
    let values: Vec<Option<String>> = dataset.iter().map(get).collect();
    Series::new(name.into(), values).into()
}

/// Build a frame with the seven schema columns in schema order, followed by
/// any pass-through columns in name order.
pub fn dataset_to_frame(dataset: &Dataset) -> Result<DataFrame> {
    let mut columns: Vec<FrameColumn> = Vec::with_capacity(Column::ALL.len());
    for column in Column::ALL {
        let name = column.name();
        let frame_column = match column {
            Column::VisitId => text_column(name, dataset, |r| r.visit_id.clone()),
            Column::PatientId => text_column(name, dataset, |r| r.patient_id.clone()),
            Column::ProviderId => text_column(name, dataset, |r| r.provider_id.clone()),
            Column::DiagnosisCode => text_column(name, dataset, |r| r.diagnosis_code.clone()),
            Column::VisitDate => text_column(name, dataset, |r| r.visit_date.map(format_date)),
            Column::LastUpdated => {
                text_column(name, dataset, |r| r.last_updated.map(format_timestamp))
            }
            Column::VisitCost => {
                let values: Vec<Option<f64>> = dataset.iter().map(|r| r.visit_cost).collect();
                Series::new(name.into(), values).into()
            }
        };
        columns.push(frame_column);
    }

    let extra: BTreeSet<&str> = dataset
        .iter()
        .flat_map(|record| record.extra.keys().map(String::as_str))
        .collect();
    for name in extra {
        columns.push(text_column(name, dataset, |r| r.extra.get(name).cloned()));
    }

    DataFrame::new(columns).map_err(|source| LoadError::Frame { source })
}

/// Write a dataset as a CSV file with a header row, replacing any existing file.
pub fn write_csv_artifact(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut frame = dataset_to_frame(dataset)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LoadError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut file = File::create(path).map_err(|source| LoadError::Io {
        operation: "create",
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .map_err(|source| LoadError::CsvWrite {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), rows = dataset.len(), "staging artifact written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn frame_has_schema_columns_then_extras() {
        let mut record = VisitRecord {
            visit_id: Some("V1".into()),
            visit_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            visit_cost: Some(12.5),
            last_updated: Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).single(),
            ..VisitRecord::default()
        };
        record.extra.insert("clinic".into(), "North".into());
        let frame = dataset_to_frame(&Dataset::new(vec![record])).unwrap();

        let names: Vec<_> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "visit_id",
                "patient_id",
                "provider_id",
                "diagnosis_code",
                "visit_date",
                "visit_cost",
                "last_updated",
                "clinic"
            ]
        );
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn empty_dataset_gives_empty_frame() {
        let frame = dataset_to_frame(&Dataset::default()).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 7);
    }

    #[test]
    fn timestamps_are_fixed_width() {
        let a = format_timestamp(Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap());
        assert_eq!(a, "2024-01-05T10:00:00.000000Z");
    }
}
