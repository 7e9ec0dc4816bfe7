//! Publishing staged visit data.
//!
//! - CSV staging artifacts built from Polars frames ([`write_csv_artifact`])
//! - The SQLite [`Warehouse`] with its staging table, `fact_visits` and
//!   `daily_visit_metrics`

mod error;
mod frame;
mod warehouse;

pub use error::{LoadError, Result};
pub use frame::{dataset_to_frame, format_date, format_timestamp, write_csv_artifact};
pub use warehouse::{DailyMetric, LoadMode, LoadStats, STAGING_TABLE, Warehouse};
