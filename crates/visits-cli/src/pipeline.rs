//! Run orchestration.
//!
//! [`stage_run`] is the pure core: transforms, the quality gate and the
//! resulting [`RunOutcome`]. [`run_pipeline`] wraps it with the file and
//! database I/O of a full run.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span};

use visits_ingest::{extract_to_raw_at, raw_visits};
use visits_load::{LoadMode, LoadStats, Warehouse, write_csv_artifact};
use visits_model::{DqConfig, EtlConfig, QualityReport, RawVisit, RunState, RunStatePolicy};
use visits_quality::{GateInput, ReportPaths, ReportSource, evaluate, write_quality_report};
use visits_state::{JsonFileStore, RunStateStore};
use visits_transform::{StagedData, compute_watermark, effective_watermark, stage};

use crate::config::PipelineConfig;
use crate::logging::redact_value;

/// A run whose data passed the gate and may be published.
#[derive(Debug, Clone)]
pub struct PublishedRun {
    pub staged: StagedData,
    pub report: QualityReport,
    /// Maximum watermark-column value in the accepted set.
    pub new_watermark: Option<DateTime<Utc>>,
    /// State to save once publishing succeeds. Its watermark never moves
    /// backwards from the prior state's.
    pub next_state: RunState,
}

/// A run stopped by a blocking check. Nothing downstream is published.
#[derive(Debug, Clone)]
pub struct BlockedRun {
    pub staged: StagedData,
    pub report: QualityReport,
    /// Row-count bookkeeping to save, when the policy asks for it. Carries
    /// the prior watermark unchanged.
    pub state_update: Option<RunState>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Published(PublishedRun),
    Blocked(BlockedRun),
}

impl RunOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, RunOutcome::Published(_))
    }

    pub fn staged(&self) -> &StagedData {
        match self {
            RunOutcome::Published(run) => &run.staged,
            RunOutcome::Blocked(run) => &run.staged,
        }
    }

    pub fn report(&self) -> &QualityReport {
        match self {
            RunOutcome::Published(run) => &run.report,
            RunOutcome::Blocked(run) => &run.report,
        }
    }
}

/// Transform and gate one batch of raw rows against the prior run state.
pub fn stage_run(
    raw: Vec<RawVisit>,
    etl: &EtlConfig,
    dq: &DqConfig,
    policy: &RunStatePolicy,
    prior: Option<&RunState>,
) -> RunOutcome {
    let watermark = effective_watermark(&etl.incremental, prior);
    let staged = stage(raw, etl, watermark);
    let report = evaluate(
        GateInput {
            screened: &staged.screened,
            accepted: &staged.accepted,
        },
        &etl.required_columns,
        dq,
        prior.map(|state| state.last_row_count),
    );
    let row_count = staged.accepted.len() as u64;
    let prior_watermark = prior.and_then(|state| state.watermark);

    if report.passed {
        let new_watermark = compute_watermark(&staged.accepted, etl.watermark_column);
        let next_state = RunState::new(row_count, new_watermark.max(prior_watermark));
        RunOutcome::Published(PublishedRun {
            staged,
            report,
            new_watermark,
            next_state,
        })
    } else {
        let state_update = policy
            .record_blocked_row_count
            .then(|| RunState::new(row_count, prior_watermark));
        RunOutcome::Blocked(BlockedRun {
            staged,
            report,
            state_update,
        })
    }
}

/// What a full run did, for reporting.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub source: ReportSource,
    pub prior_state: Option<RunState>,
    pub outcome: RunOutcome,
    pub report_paths: ReportPaths,
    pub rejects_path: PathBuf,
    /// Set on published runs only.
    pub clean_path: Option<PathBuf>,
    pub load_mode: Option<LoadMode>,
    pub load_stats: Option<LoadStats>,
    /// State written at the end of the run, if any.
    pub saved_state: Option<RunState>,
    pub duration_ms: u128,
}

impl RunSummary {
    pub fn is_published(&self) -> bool {
        self.outcome.is_published()
    }
}

/// Run the pipeline with the configured JSON run state file.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    let store = JsonFileStore::new(&config.paths.state_file);
    run_pipeline_with(config, &store, Utc::now())
}

/// Run the pipeline against `store`, stamping artifacts with `started_at`.
///
/// The run state is saved last, so a failure while publishing leaves the
/// watermark where it was.
pub fn run_pipeline_with(
    config: &PipelineConfig,
    store: &dyn RunStateStore,
    started_at: DateTime<Utc>,
) -> Result<RunSummary> {
    let span = info_span!("run", started_at = %started_at);
    let _guard = span.enter();
    let run_start = Instant::now();
    let paths = &config.paths;

    let snapshot = info_span!("extract").in_scope(|| {
        extract_to_raw_at(&paths.input_csv, &paths.raw_dir, started_at)
            .with_context(|| format!("extract {}", paths.input_csv.display()))
    })?;
    let raw = raw_visits(&snapshot.table)
        .with_context(|| format!("read snapshot {}", snapshot.path.display()))?;
    let source = ReportSource {
        raw_snapshot: snapshot.path.clone(),
        sha256: snapshot.sha256.clone(),
        raw_rows: snapshot.rows,
    };

    let prior_state = store.load().context("load run state")?;
    match &prior_state {
        Some(state) => debug!(
            last_row_count = state.last_row_count,
            watermark = ?state.watermark,
            "prior run state loaded"
        ),
        None => info!("no prior run state, treating as first run"),
    }

    let outcome = stage_run(
        raw,
        &config.etl,
        &config.dq,
        &config.run_state,
        prior_state.as_ref(),
    );
    for record in outcome.staged().rejected.iter() {
        debug!(
            visit_id = redact_value(record.visit_id.as_deref().unwrap_or("")),
            patient_id = redact_value(record.patient_id.as_deref().unwrap_or("")),
            "row rejected"
        );
    }

    let report_paths = write_quality_report(
        outcome.report(),
        &paths.reports_dir,
        started_at,
        Some(source.clone()),
    )
    .context("write quality report")?;
    let rejects_path = paths.staging_rejects();
    write_csv_artifact(&outcome.staged().rejected, &rejects_path)
        .context("write rejected rows")?;

    let mut summary = RunSummary {
        started_at,
        source,
        prior_state,
        outcome,
        report_paths,
        rejects_path,
        clean_path: None,
        load_mode: None,
        load_stats: None,
        saved_state: None,
        duration_ms: 0,
    };

    match &summary.outcome {
        RunOutcome::Published(run) => {
            let incremental = config.etl.incremental.enabled
                && summary.prior_state.is_some_and(|s| s.watermark.is_some());
            let mode = if incremental {
                LoadMode::Upsert
            } else {
                LoadMode::Replace
            };
            let stats = info_span!("load").in_scope(|| -> Result<LoadStats> {
                let mut warehouse = Warehouse::open(&paths.sqlite_db)
                    .with_context(|| format!("open {}", paths.sqlite_db.display()))?;
                let stats = warehouse
                    .load_staging(&run.staged.accepted, mode)
                    .context("load staging table")?;
                warehouse
                    .build_analytics_tables()
                    .context("build analytics tables")?;
                Ok(stats)
            })?;
            let clean_path = paths.staging_clean();
            write_csv_artifact(&run.staged.accepted, &clean_path)
                .context("write accepted rows")?;
            store.save(&run.next_state).context("save run state")?;

            summary.clean_path = Some(clean_path);
            summary.load_mode = Some(mode);
            summary.load_stats = Some(stats);
            summary.saved_state = Some(run.next_state);
            info!(
                accepted = run.staged.accepted.len(),
                watermark = ?run.next_state.watermark,
                "run published"
            );
        }
        RunOutcome::Blocked(run) => {
            for check in run.report.blocking_failures() {
                error!(check = %check.name, details = %check.details, "blocking check failed");
            }
            if let Some(state) = &run.state_update {
                store.save(state).context("save run state")?;
                summary.saved_state = Some(*state);
            }
            error!(
                failures = run.report.blocking_failures().count(),
                "quality gate blocked publish"
            );
        }
    }

    summary.duration_ms = run_start.elapsed().as_millis();
    info!(duration_ms = summary.duration_ms, "run finished");
    Ok(summary)
}
