//! Known source columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Storage type of a column once the record has been normalized and cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
    Timestamp,
    Numeric,
}

/// A column of the visit schema.
///
/// The set is closed: configuration that names anything else is rejected
/// when it is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    VisitId,
    PatientId,
    ProviderId,
    DiagnosisCode,
    VisitDate,
    VisitCost,
    LastUpdated,
}

impl Column {
    /// All schema columns in source order.
    pub const ALL: [Column; 7] = [
        Column::VisitId,
        Column::PatientId,
        Column::ProviderId,
        Column::DiagnosisCode,
        Column::VisitDate,
        Column::VisitCost,
        Column::LastUpdated,
    ];

    /// Header name as it appears in the source file and in the warehouse.
    pub fn name(self) -> &'static str {
        match self {
            Column::VisitId => "visit_id",
            Column::PatientId => "patient_id",
            Column::ProviderId => "provider_id",
            Column::DiagnosisCode => "diagnosis_code",
            Column::VisitDate => "visit_date",
            Column::VisitCost => "visit_cost",
            Column::LastUpdated => "last_updated",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::VisitId | Column::PatientId | Column::ProviderId | Column::DiagnosisCode => {
                ColumnKind::Text
            }
            Column::VisitDate => ColumnKind::Date,
            Column::VisitCost => ColumnKind::Numeric,
            Column::LastUpdated => ColumnKind::Timestamp,
        }
    }

    /// Whether values of this column can be compared against a watermark.
    pub fn is_temporal(self) -> bool {
        matches!(self.kind(), ColumnKind::Date | ColumnKind::Timestamp)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Column::ALL
            .into_iter()
            .find(|column| column.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::UnknownColumn {
                name: trimmed.to_string(),
            })
    }
}
