//! Quality report persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use visits_common::{replace_file, write_new_file};
use visits_model::{CheckResult, QualityMetrics, QualityReport};

use crate::error::{QualityError, Result};

/// File name of the copy that always holds the most recent report.
pub const LATEST_REPORT: &str = "dq_report_latest.json";

/// Where the evaluated data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSource {
    pub raw_snapshot: PathBuf,
    pub sha256: String,
    pub raw_rows: usize,
}

/// On-disk shape of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub generated_at_utc: String,
    pub passed: bool,
    pub metrics: QualityMetrics,
    pub checks: Vec<CheckResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ReportSource>,
}

impl ReportDocument {
    pub fn new(
        report: &QualityReport,
        generated_at: DateTime<Utc>,
        source: Option<ReportSource>,
    ) -> Self {
        Self {
            generated_at_utc: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            passed: report.passed,
            metrics: report.metrics.clone(),
            checks: report.checks.clone(),
            source,
        }
    }
}

/// Paths written by [`write_quality_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub stamped: PathBuf,
    pub latest: PathBuf,
}

/// Name of the timestamped report for `at`.
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("dq_report_{}.json", at.format("%Y%m%dT%H%M%SZ"))
}

/// Write the report to `reports_dir` as a timestamped file and as
/// [`LATEST_REPORT`].
pub fn write_quality_report(
    report: &QualityReport,
    reports_dir: &Path,
    generated_at: DateTime<Utc>,
    source: Option<ReportSource>,
) -> Result<ReportPaths> {
    let document = ReportDocument::new(report, generated_at, source);
    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|source| QualityError::Serialization { source })?;

    fs::create_dir_all(reports_dir).map_err(io_error("create directory", reports_dir))?;

    let stamped = write_new_file(reports_dir, &report_file_name(generated_at), &bytes)?;

    let latest = reports_dir.join(LATEST_REPORT);
    replace_file(&latest, &bytes)?;

    info!(
        path = %stamped.display(),
        passed = report.passed,
        checks = report.checks.len(),
        "quality report written"
    );
    Ok(ReportPaths { stamped, latest })
}

/// Read a report written by [`write_quality_report`].
pub fn read_quality_report(path: &Path) -> Result<ReportDocument> {
    let bytes = fs::read(path).map_err(io_error("read", path))?;
    serde_json::from_slice(&bytes).map_err(|source| QualityError::Deserialization {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> QualityError {
    let path = path.to_path_buf();
    move |source| QualityError::Io {
        operation,
        path,
        source,
    }
}
