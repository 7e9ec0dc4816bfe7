//! Pipeline configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use visits_model::{ConfigError, DqConfig, EtlConfig, RunStatePolicy};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum PipelineConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub etl: EtlConfig,
    pub dq: DqConfig,
    #[serde(default)]
    pub run_state: RunStatePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input_csv: PathBuf,
    pub raw_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub sqlite_db: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("data/reports")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("data/state/run_state.json")
}

impl PathsConfig {
    pub fn staging_clean(&self) -> PathBuf {
        self.staging_dir.join("staging_clean.csv")
    }

    pub fn staging_rejects(&self) -> PathBuf {
        self.staging_dir.join("staging_rejects.csv")
    }
}

impl PipelineConfig {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, PipelineConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|source| PipelineConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("paths.input_csv", &self.paths.input_csv),
            ("paths.raw_dir", &self.paths.raw_dir),
            ("paths.staging_dir", &self.paths.staging_dir),
            ("paths.sqlite_db", &self.paths.sqlite_db),
            ("paths.reports_dir", &self.paths.reports_dir),
            ("paths.state_file", &self.paths.state_file),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("{key} must not be empty"),
                });
            }
        }
        self.etl.validate()?;
        self.dq.validate()
    }
}

/// Read, parse and validate the configuration file.
pub fn load_config(path: &Path) -> Result<PipelineConfig, PipelineConfigError> {
    let text = fs::read_to_string(path).map_err(|source| PipelineConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    PipelineConfig::from_yaml(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use visits_model::Column;

    const YAML: &str = r"
paths:
  input_csv: data/input/patient_visits.csv
  raw_dir: data/raw
  staging_dir: data/staging
  sqlite_db: data/warehouse.db
etl:
  required_columns: [visit_id, patient_id, visit_date]
  dedupe_key: visit_id
  dedupe_order_by: last_updated
  incremental:
    enabled: true
    lookback_hours: 24
dq:
  fail_on:
    row_count_lt: 1
    required_null_rate_gt: 0.0
    invalid_visit_date_rate_gt: 0.05
  warn_on:
    visit_cost_null_rate_gt: 0.1
  row_count_drop_warn_pct: 0.3
";

    fn parse(text: &str) -> Result<PipelineConfig, PipelineConfigError> {
        PipelineConfig::from_yaml(text, Path::new("config.yaml"))
    }

    #[test]
    fn parses_with_defaults() {
        let config = parse(YAML).unwrap();
        assert_eq!(config.paths.reports_dir, PathBuf::from("data/reports"));
        assert_eq!(
            config.paths.state_file,
            PathBuf::from("data/state/run_state.json")
        );
        assert_eq!(config.etl.watermark_column, Column::LastUpdated);
        assert_eq!(config.etl.incremental.lookback_hours, 24);
        assert!(!config.run_state.record_blocked_row_count);
        assert_eq!(
            config.paths.staging_clean(),
            PathBuf::from("data/staging/staging_clean.csv")
        );
    }

    #[test]
    fn unknown_column_fails_to_parse() {
        let text = YAML.replace("dedupe_key: visit_id", "dedupe_key: visit_number");
        assert!(matches!(parse(&text), Err(PipelineConfigError::Parse { .. })));
    }

    #[test]
    fn missing_section_fails_to_parse() {
        let text = YAML.replace("  row_count_drop_warn_pct: 0.3\n", "");
        assert!(matches!(parse(&text), Err(PipelineConfigError::Parse { .. })));
    }

    #[test]
    fn out_of_range_threshold_is_invalid() {
        let text = YAML.replace("required_null_rate_gt: 0.0", "required_null_rate_gt: 1.5");
        assert!(matches!(
            parse(&text),
            Err(PipelineConfigError::Invalid(ConfigError::RateOutOfRange { .. }))
        ));
    }

    #[test]
    fn negative_lookback_fails_to_parse() {
        let text = YAML.replace("lookback_hours: 24", "lookback_hours: -1");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_config(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(matches!(err, PipelineConfigError::Read { .. }));
    }
}
