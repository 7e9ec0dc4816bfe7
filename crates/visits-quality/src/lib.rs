//! Data-quality gate for staged visit data.
//!
//! [`evaluate`] runs the check battery and returns a [`QualityReport`]
//! whose verdict is the AND of all blocking checks. Advisory checks are
//! always reported but never change the verdict.
//!
//! [`QualityReport`]: visits_model::QualityReport

pub mod checks;
mod error;
pub mod gate;
pub mod report;

pub use checks::{drop_pct, null_rate, parseable_rate};
pub use error::{QualityError, Result};
pub use gate::{GateInput, evaluate};
pub use report::{
    LATEST_REPORT, ReportDocument, ReportPaths, ReportSource, read_quality_report,
    report_file_name, write_quality_report,
};
