//! Visit records at each pipeline stage.
//!
//! A source row starts as a [`RawVisit`] (all text), becomes a
//! [`NormalizedVisit`] once its date fields are parsed and ends up as a
//! [`VisitRecord`] once `visit_cost` is cast. Unparseable values are carried
//! as `None` at every stage; rejecting them is the validator's job.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::column::Column;

/// A source row before any parsing. Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVisit {
    pub visit_id: Option<String>,
    pub patient_id: Option<String>,
    pub provider_id: Option<String>,
    pub diagnosis_code: Option<String>,
    pub visit_date: Option<String>,
    pub visit_cost: Option<String>,
    pub last_updated: Option<String>,
    /// Columns outside the visit schema, carried through untouched.
    pub extra: BTreeMap<String, String>,
}

impl RawVisit {
    /// Set a schema column from a source cell, treating blank text as missing.
    pub fn set(&mut self, column: Column, value: &str) {
        let value = non_blank(value);
        match column {
            Column::VisitId => self.visit_id = value,
            Column::PatientId => self.patient_id = value,
            Column::ProviderId => self.provider_id = value,
            Column::DiagnosisCode => self.diagnosis_code = value,
            Column::VisitDate => self.visit_date = value,
            Column::VisitCost => self.visit_cost = value,
            Column::LastUpdated => self.last_updated = value,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A visit with parsed dates. `C` is the type of `visit_cost` at this stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visit<C> {
    pub visit_id: Option<String>,
    pub patient_id: Option<String>,
    pub provider_id: Option<String>,
    pub diagnosis_code: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub visit_cost: C,
    pub last_updated: Option<DateTime<Utc>>,
    pub extra: BTreeMap<String, String>,
}

/// Output of the normalizer: dates parsed, cost still text.
pub type NormalizedVisit = Visit<Option<String>>;

/// Fully typed record.
pub type VisitRecord = Visit<Option<f64>>;

impl<C> Visit<C> {
    /// Replace the cost field, keeping everything else.
    pub fn map_cost<D>(self, f: impl FnOnce(C) -> D) -> Visit<D> {
        Visit {
            visit_id: self.visit_id,
            patient_id: self.patient_id,
            provider_id: self.provider_id,
            diagnosis_code: self.diagnosis_code,
            visit_date: self.visit_date,
            visit_cost: f(self.visit_cost),
            last_updated: self.last_updated,
            extra: self.extra,
        }
    }
}

impl VisitRecord {
    /// Typed value of a column, `None` when missing.
    pub fn value(&self, column: Column) -> Option<Value<'_>> {
        match column {
            Column::VisitId => self.visit_id.as_deref().map(Value::Text),
            Column::PatientId => self.patient_id.as_deref().map(Value::Text),
            Column::ProviderId => self.provider_id.as_deref().map(Value::Text),
            Column::DiagnosisCode => self.diagnosis_code.as_deref().map(Value::Text),
            Column::VisitDate => self.visit_date.map(Value::Date),
            Column::VisitCost => self.visit_cost.map(Value::Number),
            Column::LastUpdated => self.last_updated.map(Value::Timestamp),
        }
    }

    pub fn is_missing(&self, column: Column) -> bool {
        self.value(column).is_none()
    }

    /// The column as an instant; dates are taken at midnight UTC.
    pub fn instant(&self, column: Column) -> Option<DateTime<Utc>> {
        self.value(column).and_then(Value::as_instant)
    }
}

/// A borrowed, typed cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Number(f64),
}

impl Value<'_> {
    pub fn as_instant(self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            Value::Date(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
            Value::Text(_) | Value::Number(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Text(_) => 0,
            Value::Date(_) => 1,
            Value::Timestamp(_) => 2,
            Value::Number(_) => 3,
        }
    }

    /// Total order over values. Values of one column always share a variant;
    /// mixed variants fall back to a fixed variant rank.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// An ordered collection of records produced by one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<VisitRecord>,
}

impl Dataset {
    pub fn new(records: Vec<VisitRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[VisitRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisitRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<VisitRecord> {
        self.records
    }

    /// Count of records whose `column` is missing.
    pub fn missing_count(&self, column: Column) -> usize {
        self.records
            .iter()
            .filter(|record| record.is_missing(column))
            .count()
    }
}

impl FromIterator<VisitRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = VisitRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Dataset {
    type Item = VisitRecord;
    type IntoIter = std::vec::IntoIter<VisitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a VisitRecord;
    type IntoIter = std::slice::Iter<'a, VisitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn raw_set_treats_blank_as_missing() {
        let mut raw = RawVisit::default();
        raw.set(Column::VisitId, "  V1 ");
        raw.set(Column::VisitCost, "   ");
        assert_eq!(raw.visit_id.as_deref(), Some("V1"));
        assert!(raw.visit_cost.is_none());
    }

    #[test]
    fn date_instant_is_midnight_utc() {
        let record = VisitRecord {
            visit_date: NaiveDate::from_ymd_opt(2024, 1, 9),
            ..VisitRecord::default()
        };
        assert_eq!(
            record.instant(Column::VisitDate),
            Some(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(record.instant(Column::VisitId), None);
    }

    #[test]
    fn value_ordering() {
        assert_eq!(
            Value::Number(1.5).total_cmp(&Value::Number(2.0)),
            Ordering::Less
        );
        assert_eq!(Value::Text("b").total_cmp(&Value::Text("a")), Ordering::Greater);
    }

    #[test]
    fn missing_count_per_column() {
        let dataset: Dataset = vec![
            VisitRecord {
                visit_id: Some("V1".into()),
                ..VisitRecord::default()
            },
            VisitRecord::default(),
        ]
        .into_iter()
        .collect();
        assert_eq!(dataset.missing_count(Column::VisitId), 1);
        assert_eq!(dataset.missing_count(Column::PatientId), 2);
    }
}
