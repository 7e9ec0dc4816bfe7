//! Incremental filtering against the run-state watermark.

use chrono::{DateTime, Duration, Utc};

use visits_model::{Column, Dataset, IncrementalConfig, RunState};

/// Lower bound for retained rows: `watermark - lookback_hours`, saturating at
/// the earliest representable instant.
pub fn watermark_cutoff(watermark: DateTime<Utc>, lookback_hours: u32) -> DateTime<Utc> {
    watermark
        .checked_sub_signed(Duration::hours(i64::from(lookback_hours)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Keep rows whose `column` is at or after the cutoff.
///
/// An absent watermark returns the input unchanged. Rows with a missing
/// value in `column` are dropped. Date columns compare at midnight UTC.
pub fn filter_since_watermark(
    dataset: Dataset,
    column: Column,
    watermark: Option<DateTime<Utc>>,
    lookback_hours: u32,
) -> Dataset {
    let Some(watermark) = watermark else {
        return dataset;
    };
    let cutoff = watermark_cutoff(watermark, lookback_hours);
    dataset
        .into_iter()
        .filter(|record| record.instant(column).is_some_and(|at| at >= cutoff))
        .collect()
}

/// The watermark to filter with this run: the prior state's value when
/// incremental mode is on, otherwise none (full refresh).
pub fn effective_watermark(
    incremental: &IncrementalConfig,
    prior: Option<&RunState>,
) -> Option<DateTime<Utc>> {
    if !incremental.enabled {
        return None;
    }
    prior.and_then(|state| state.watermark)
}

/// Maximum value of `column` across the dataset; `None` when empty.
pub fn compute_watermark(dataset: &Dataset, column: Column) -> Option<DateTime<Utc>> {
    dataset.iter().filter_map(|record| record.instant(column)).max()
}
