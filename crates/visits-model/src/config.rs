//! Configuration consumed by the transform and quality stages.
//!
//! These types are deserialized from the `etl`, `dq` and `run_state`
//! sections of the pipeline configuration file and handed to each stage
//! explicitly.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{ConfigError, Result};

/// Transform options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Columns that must be present (after normalization) for a row to be accepted.
    pub required_columns: Vec<Column>,
    /// Business key; unique in the accepted set.
    pub dedupe_key: Column,
    /// Latest value of this column wins when keys collide.
    pub dedupe_order_by: Column,
    /// Column compared against the run-state watermark.
    #[serde(default = "default_watermark_column")]
    pub watermark_column: Column,
    #[serde(default)]
    pub incremental: IncrementalConfig,
}

fn default_watermark_column() -> Column {
    Column::LastUpdated
}

/// Incremental (watermark) processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Margin subtracted from the watermark to pick up late-arriving rows.
    #[serde(default)]
    pub lookback_hours: u32,
}

impl EtlConfig {
    pub fn validate(&self) -> Result<()> {
        for (idx, column) in self.required_columns.iter().enumerate() {
            if self.required_columns[..idx].contains(column) {
                return Err(ConfigError::DuplicateRequiredColumn { column: *column });
            }
        }
        if !self.watermark_column.is_temporal() {
            return Err(ConfigError::NonTemporalWatermark {
                column: self.watermark_column,
            });
        }
        Ok(())
    }
}

/// Data-quality thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqConfig {
    pub fail_on: FailOn,
    pub warn_on: WarnOn,
    /// Relative drop against the previous run that triggers a warning.
    pub row_count_drop_warn_pct: f64,
}

/// Blocking thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailOn {
    /// Fail when fewer rows than this are accepted.
    pub row_count_lt: u64,
    /// Fail when any required column's null rate exceeds this.
    pub required_null_rate_gt: f64,
    /// Fail when the unparseable `visit_date` rate exceeds this.
    pub invalid_visit_date_rate_gt: f64,
}

/// Advisory thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarnOn {
    pub visit_cost_null_rate_gt: f64,
}

impl DqConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate(
            "dq.fail_on.required_null_rate_gt",
            self.fail_on.required_null_rate_gt,
        )?;
        check_rate(
            "dq.fail_on.invalid_visit_date_rate_gt",
            self.fail_on.invalid_visit_date_rate_gt,
        )?;
        check_rate(
            "dq.warn_on.visit_cost_null_rate_gt",
            self.warn_on.visit_cost_null_rate_gt,
        )?;
        let drop = self.row_count_drop_warn_pct;
        if !drop.is_finite() || drop < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                key: "dq.row_count_drop_warn_pct",
                value: drop,
            });
        }
        Ok(())
    }
}

fn check_rate(key: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { key, value })
    }
}

/// What a blocked run is allowed to write to the run state.
///
/// A blocked run never moves the watermark. With `record_blocked_row_count`
/// set it still records its accepted row count so the next run's drop check
/// compares against the latest attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatePolicy {
    #[serde(default)]
    pub record_blocked_row_count: bool,
}
