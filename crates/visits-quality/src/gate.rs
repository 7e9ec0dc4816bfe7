//! The quality gate: a fixed battery of checks over one run's data.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use visits_model::{
    CheckDetails, CheckName, CheckResult, Column, Dataset, DqConfig, QualityMetrics,
    QualityReport, Severity,
};

use crate::checks::{drop_pct, null_rate, parseable_rate};

/// The two views the gate reads.
///
/// Row counts are taken from `accepted`. Rates are taken from `screened`,
/// the validator's input, so they describe the data as received rather than
/// what survived rejection.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    pub screened: &'a Dataset,
    pub accepted: &'a Dataset,
}

impl<'a> GateInput<'a> {
    /// Same dataset for both views.
    pub fn single(dataset: &'a Dataset) -> Self {
        Self {
            screened: dataset,
            accepted: dataset,
        }
    }
}

/// Evaluate every check, in fixed order, and build the report.
///
/// `row_count_drop_pct` is only emitted when `previous_row_count` is known
/// and positive.
pub fn evaluate(
    input: GateInput<'_>,
    required_columns: &[Column],
    config: &DqConfig,
    previous_row_count: Option<u64>,
) -> QualityReport {
    let row_count = input.accepted.len() as u64;
    let required_null_rates: BTreeMap<String, f64> = required_columns
        .iter()
        .map(|column| (column.name().to_string(), null_rate(input.screened, *column)))
        .collect();
    let visit_date_parse_rate = parseable_rate(input.screened, Column::VisitDate);
    let visit_cost_null_rate = null_rate(input.screened, Column::VisitCost);

    let mut checks = Vec::with_capacity(5);

    let min_rows = config.fail_on.row_count_lt;
    checks.push(CheckResult {
        name: CheckName::RowCountMin,
        severity: Severity::Fail,
        passed: row_count >= min_rows,
        details: CheckDetails::RowCount {
            row_count,
            min_rows,
        },
    });

    let threshold = config.fail_on.required_null_rate_gt;
    checks.push(CheckResult {
        name: CheckName::RequiredNullRate,
        severity: Severity::Fail,
        passed: required_null_rates.values().all(|rate| *rate <= threshold),
        details: CheckDetails::NullRates {
            threshold,
            rates: required_null_rates.clone(),
        },
    });

    // From counts, not `1.0 - parse_rate`: a rate at its threshold must compare equal.
    let invalid_rows = input.screened.missing_count(Column::VisitDate) as u64;
    let invalid_rate = null_rate(input.screened, Column::VisitDate);
    let threshold = config.fail_on.invalid_visit_date_rate_gt;
    checks.push(CheckResult {
        name: CheckName::VisitDateInvalidRate,
        severity: Severity::Fail,
        passed: invalid_rate <= threshold,
        details: CheckDetails::InvalidRate {
            invalid_rate,
            threshold,
            invalid_rows,
            rows: input.screened.len() as u64,
        },
    });

    let threshold = config.warn_on.visit_cost_null_rate_gt;
    checks.push(CheckResult {
        name: CheckName::VisitCostNullRate,
        severity: Severity::Warn,
        passed: visit_cost_null_rate <= threshold,
        details: CheckDetails::NullRate {
            null_rate: visit_cost_null_rate,
            threshold,
        },
    });

    let mut row_count_drop_pct = None;
    if let Some(previous_row_count) = previous_row_count.filter(|count| *count > 0) {
        let drop = drop_pct(previous_row_count, row_count);
        let threshold = config.row_count_drop_warn_pct;
        row_count_drop_pct = Some(drop);
        checks.push(CheckResult {
            name: CheckName::RowCountDropPct,
            severity: Severity::Warn,
            passed: drop <= threshold,
            details: CheckDetails::RowCountDrop {
                drop_pct: drop,
                threshold,
                previous_row_count,
                row_count,
            },
        });
    }

    for check in &checks {
        debug!(check = %check.name, passed = check.passed, details = %check.details, "check evaluated");
        if !check.passed && !check.severity.is_blocking() {
            warn!(check = %check.name, details = %check.details, "advisory check failed");
        }
    }

    let metrics = QualityMetrics {
        row_count,
        screened_row_count: input.screened.len() as u64,
        required_null_rates,
        visit_date_parse_rate,
        visit_cost_null_rate,
        row_count_drop_pct,
    };
    QualityReport::new(metrics, checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use visits_model::{FailOn, VisitRecord, WarnOn};

    fn config() -> DqConfig {
        DqConfig {
            fail_on: FailOn {
                row_count_lt: 1,
                required_null_rate_gt: 0.0,
                invalid_visit_date_rate_gt: 0.05,
            },
            warn_on: WarnOn {
                visit_cost_null_rate_gt: 0.1,
            },
            row_count_drop_warn_pct: 0.3,
        }
    }

    #[test]
    fn empty_input_only_fails_row_count() {
        let empty = Dataset::default();
        let report = evaluate(GateInput::single(&empty), &[Column::VisitId], &config(), None);
        let failed: Vec<_> = report.blocking_failures().map(|c| c.name).collect();
        assert_eq!(failed, vec![CheckName::RowCountMin]);
        assert_eq!(report.metrics.visit_date_parse_rate, 1.0);
        assert_eq!(report.metrics.required_null_rates["visit_id"], 0.0);
    }

    #[test]
    fn zero_previous_count_skips_drop_check() {
        let dataset = Dataset::new(vec![VisitRecord::default()]);
        let report = evaluate(GateInput::single(&dataset), &[], &config(), Some(0));
        assert!(report.check(CheckName::RowCountDropPct).is_none());
        assert!(report.metrics.row_count_drop_pct.is_none());
    }

    #[test]
    fn growth_passes_drop_check() {
        let dataset = Dataset::new(vec![VisitRecord::default(); 4]);
        let report = evaluate(GateInput::single(&dataset), &[], &config(), Some(2));
        let check = report.check(CheckName::RowCountDropPct).unwrap();
        assert!(check.passed);
        assert_eq!(report.metrics.row_count_drop_pct, Some(-1.0));
    }
}
