pub mod column;
pub mod config;
pub mod error;
pub mod quality;
pub mod record;
pub mod state;

pub use column::{Column, ColumnKind};
pub use config::{DqConfig, EtlConfig, FailOn, IncrementalConfig, RunStatePolicy, WarnOn};
pub use error::{ConfigError, Result};
pub use quality::{
    CheckDetails, CheckName, CheckResult, QualityMetrics, QualityReport, Severity,
};
pub use record::{Dataset, NormalizedVisit, RawVisit, Value, Visit, VisitRecord};
pub use state::RunState;
