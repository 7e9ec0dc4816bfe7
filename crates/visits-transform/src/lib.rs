//! Row-level transforms for visit data.
//!
//! Each stage is a pure function of its input. Unparseable values become
//! `None` and are only acted on by the validator, so which fields are
//! required stays a configuration decision.

pub mod cast;
pub mod dedupe;
pub mod normalize;
pub mod stage;
pub mod validate;
pub mod watermark;

pub use cast::{cast, parse_f64};
pub use dedupe::dedupe_latest;
pub use normalize::{normalize, normalize_visit, parse_timestamp, parse_visit_date};
pub use stage::{StagedData, stage};
pub use validate::{Partition, is_complete, validate_required};
pub use watermark::{compute_watermark, effective_watermark, filter_since_watermark, watermark_cutoff};
