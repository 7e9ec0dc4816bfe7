//! Quality report types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Check severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Blocking: a failure prevents publishing.
    #[serde(rename = "FAIL")]
    Fail,
    /// Advisory: reported, never blocks.
    #[serde(rename = "WARN")]
    Warn,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Fail => "FAIL",
            Severity::Warn => "WARN",
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Fail)
    }
}

/// Names of the checks in the quality battery, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    RowCountMin,
    RequiredNullRate,
    VisitDateInvalidRate,
    VisitCostNullRate,
    RowCountDropPct,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::RowCountMin => "row_count_min",
            CheckName::RequiredNullRate => "required_null_rate",
            CheckName::VisitDateInvalidRate => "visit_date_invalid_rate",
            CheckName::VisitCostNullRate => "visit_cost_null_rate",
            CheckName::RowCountDropPct => "row_count_drop_pct",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured value and threshold of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckDetails {
    RowCountDrop {
        drop_pct: f64,
        threshold: f64,
        previous_row_count: u64,
        row_count: u64,
    },
    RowCount {
        row_count: u64,
        min_rows: u64,
    },
    NullRates {
        threshold: f64,
        rates: BTreeMap<String, f64>,
    },
    InvalidRate {
        invalid_rate: f64,
        threshold: f64,
        invalid_rows: u64,
        rows: u64,
    },
    NullRate {
        null_rate: f64,
        threshold: f64,
    },
}

impl fmt::Display for CheckDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckDetails::RowCountDrop {
                drop_pct,
                threshold,
                previous_row_count,
                row_count,
            } => write!(
                f,
                "drop_pct={drop_pct:.4} threshold={threshold} (previous={previous_row_count}, current={row_count})"
            ),
            CheckDetails::RowCount {
                row_count,
                min_rows,
            } => write!(f, "row_count={row_count} min_rows={min_rows}"),
            CheckDetails::NullRates { threshold, rates } => {
                write!(f, "threshold={threshold}")?;
                for (column, rate) in rates {
                    write!(f, " {column}={rate:.4}")?;
                }
                Ok(())
            }
            CheckDetails::InvalidRate {
                invalid_rate,
                threshold,
                invalid_rows,
                rows,
            } => write!(
                f,
                "invalid_rate={invalid_rate:.4} threshold={threshold} ({invalid_rows} of {rows} rows)"
            ),
            CheckDetails::NullRate {
                null_rate,
                threshold,
            } => write!(f, "null_rate={null_rate:.4} threshold={threshold}"),
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: CheckName,
    pub severity: Severity,
    pub passed: bool,
    pub details: CheckDetails,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.name,
            self.severity.label(),
            if self.passed { "passed" } else { "failed" },
            self.details
        )
    }
}

/// Metrics recorded alongside the checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Rows in the accepted set.
    pub row_count: u64,
    /// Rows the validator saw (after the watermark filter, before rejection).
    pub screened_row_count: u64,
    pub required_null_rates: BTreeMap<String, f64>,
    pub visit_date_parse_rate: f64,
    pub visit_cost_null_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count_drop_pct: Option<f64>,
}

/// Verdict and findings of the quality gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub passed: bool,
    pub metrics: QualityMetrics,
    pub checks: Vec<CheckResult>,
}

impl QualityReport {
    /// Build a report; the verdict is the AND of all blocking checks.
    pub fn new(metrics: QualityMetrics, checks: Vec<CheckResult>) -> Self {
        let passed = checks
            .iter()
            .filter(|check| check.severity.is_blocking())
            .all(|check| check.passed);
        Self {
            passed,
            metrics,
            checks,
        }
    }

    pub fn check(&self, name: CheckName) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.name == name)
    }

    /// Failed checks that block publishing.
    pub fn blocking_failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|check| check.severity.is_blocking() && !check.passed)
    }

    /// Failed checks that are reported only.
    pub fn advisory_failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|check| !check.severity.is_blocking() && !check.passed)
    }
}
