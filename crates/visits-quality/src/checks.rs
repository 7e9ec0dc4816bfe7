//! Rate metrics over a dataset.

use visits_model::{Column, Dataset};

/// Fraction of rows with `column` missing. An empty dataset is `0.0`.
pub fn null_rate(dataset: &Dataset, column: Column) -> f64 {
    if dataset.is_empty() {
        return 0.0;
    }
    dataset.missing_count(column) as f64 / dataset.len() as f64
}

/// Fraction of rows with `column` present. An empty dataset is `1.0`.
///
/// Parsers turn unusable cells into missing values, so for a parsed column
/// this is the share of input that was usable.
pub fn parseable_rate(dataset: &Dataset, column: Column) -> f64 {
    if dataset.is_empty() {
        return 1.0;
    }
    let present = dataset.len() - dataset.missing_count(column);
    present as f64 / dataset.len() as f64
}

/// Relative drop from `previous` to `current`; negative when the count grew.
pub fn drop_pct(previous: u64, current: u64) -> f64 {
    (previous as f64 - current as f64) / previous as f64
}
