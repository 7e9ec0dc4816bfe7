//! Latest-wins deduplication on a business key.
//!
//! Rows are stable-sorted by `(key asc, order_by desc)` with missing values
//! last on both, then the first row of each key group is kept. Rows sharing
//! both key and `order_by` therefore resolve to the one encountered first in
//! the input. Rows with a missing key collapse into a single group. The
//! output is ordered by key.

use std::cmp::Ordering;

use visits_model::{Column, Dataset, Value, VisitRecord};

fn compare_missing_last(a: Option<Value<'_>>, b: Option<Value<'_>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_rows(a: &VisitRecord, b: &VisitRecord, key: Column, order_by: Column) -> Ordering {
    compare_missing_last(a.value(key), b.value(key)).then_with(|| {
        match (a.value(order_by), b.value(order_by)) {
            // Descending among present values; missing still sorts last.
            (Some(x), Some(y)) => y.total_cmp(&x),
            (x, y) => compare_missing_last(x, y),
        }
    })
}

/// Keep one row per `key`: the one with the greatest `order_by`.
pub fn dedupe_latest(dataset: Dataset, key: Column, order_by: Column) -> Dataset {
    let mut records = dataset.into_records();
    records.sort_by(|a, b| compare_rows(a, b, key, order_by));
    records.dedup_by(|later, kept| {
        compare_missing_last(later.value(key), kept.value(key)) == Ordering::Equal
    });
    Dataset::new(records)
}
