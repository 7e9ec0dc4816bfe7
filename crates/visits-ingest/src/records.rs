//! Conversion of a CSV table into raw visit rows.

use std::collections::BTreeSet;

use visits_model::{Column, RawVisit};

use crate::csv_table::CsvTable;
use crate::error::{IngestError, Result};

enum Slot {
    Schema(Column),
    Extra(String),
}

/// Check the header against the visit schema and convert every row.
///
/// All schema columns must be present; other columns are carried in
/// [`RawVisit::extra`].
pub fn raw_visits(table: &CsvTable) -> Result<Vec<RawVisit>> {
    let mut seen = BTreeSet::new();
    let mut slots = Vec::with_capacity(table.headers.len());
    for header in &table.headers {
        if !seen.insert(header.to_lowercase()) {
            return Err(IngestError::DuplicateColumn {
                column: header.clone(),
            });
        }
        slots.push(match header.parse::<Column>() {
            Ok(column) => Slot::Schema(column),
            Err(_) => Slot::Extra(header.clone()),
        });
    }
    let missing: Vec<String> = Column::ALL
        .iter()
        .filter(|column| {
            !slots
                .iter()
                .any(|slot| matches!(slot, Slot::Schema(found) if found == *column))
        })
        .map(|column| column.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns { columns: missing });
    }

    let visits = table
        .rows
        .iter()
        .map(|row| {
            let mut visit = RawVisit::default();
            for (slot, value) in slots.iter().zip(row) {
                match slot {
                    Slot::Schema(column) => visit.set(*column, value),
                    Slot::Extra(name) => {
                        visit.extra.insert(name.clone(), value.clone());
                    }
                }
            }
            visit
        })
        .collect();
    Ok(visits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    const HEADERS: [&str; 8] = [
        "visit_id",
        "patient_id",
        "provider_id",
        "diagnosis_code",
        "visit_date",
        "visit_cost",
        "last_updated",
        "clinic",
    ];

    #[test]
    fn converts_rows_and_keeps_extra_columns() {
        let table = table(
            &HEADERS,
            &[&["V1", "P1", "D1", "J10", "2024-01-05", "", "2024-01-05T10:00:00Z", "North"]],
        );
        let visits = raw_visits(&table).unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].visit_id.as_deref(), Some("V1"));
        assert!(visits[0].visit_cost.is_none());
        assert_eq!(visits[0].extra.get("clinic").map(String::as_str), Some("North"));
    }

    #[test]
    fn reports_every_missing_column() {
        let table = table(&["visit_id", "patient_id"], &[]);
        match raw_visits(&table) {
            Err(IngestError::MissingColumns { columns }) => {
                assert_eq!(
                    columns,
                    vec![
                        "provider_id",
                        "diagnosis_code",
                        "visit_date",
                        "visit_cost",
                        "last_updated"
                    ]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_headers() {
        let mut headers = HEADERS.to_vec();
        headers.push("VISIT_ID");
        assert!(matches!(
            raw_visits(&table(&headers, &[])),
            Err(IngestError::DuplicateColumn { .. })
        ));
    }
}
