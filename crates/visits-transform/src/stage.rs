//! The staging chain: normalize, cast, filter, validate, dedupe.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span};

use visits_model::{Dataset, EtlConfig, RawVisit};

use crate::cast::cast;
use crate::dedupe::dedupe_latest;
use crate::normalize::normalize;
use crate::validate::{Partition, validate_required};
use crate::watermark::filter_since_watermark;

/// Every view of one run's data that later stages need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedData {
    /// Rows read from the source.
    pub raw_rows: usize,
    /// Typed rows that passed the watermark filter, before validation.
    pub screened: Dataset,
    /// Valid, deduplicated rows.
    pub accepted: Dataset,
    /// Rows missing a required column.
    pub rejected: Dataset,
    pub duplicates_dropped: usize,
}

impl StagedData {
    /// Rows removed by the watermark filter.
    pub fn filtered_out(&self) -> usize {
        self.raw_rows.saturating_sub(self.screened.len())
    }
}

/// Run the transform chain over raw rows.
///
/// `watermark` is the effective watermark for this run; `None` processes the
/// full input.
pub fn stage(
    raw: Vec<RawVisit>,
    config: &EtlConfig,
    watermark: Option<DateTime<Utc>>,
) -> StagedData {
    let span = info_span!("stage", incremental = watermark.is_some());
    let _guard = span.enter();
    let start = Instant::now();
    let raw_rows = raw.len();

    let typed = cast(normalize(raw));
    let screened = filter_since_watermark(
        typed,
        config.watermark_column,
        watermark,
        config.incremental.lookback_hours,
    );
    debug!(
        raw_rows,
        screened = screened.len(),
        watermark = ?watermark,
        "watermark filter applied"
    );

    let Partition { accepted, rejected } =
        validate_required(screened.clone(), &config.required_columns);
    let valid = accepted.len();
    let accepted = dedupe_latest(accepted, config.dedupe_key, config.dedupe_order_by);
    let duplicates_dropped = valid - accepted.len();

    info!(
        raw_rows,
        accepted = accepted.len(),
        rejected = rejected.len(),
        duplicates_dropped,
        duration_ms = start.elapsed().as_millis(),
        "staging complete"
    );

    StagedData {
        raw_rows,
        screened,
        accepted,
        rejected,
        duplicates_dropped,
    }
}
