use anyhow::{Context, Result};

use visits_cli::config::load_config;
use visits_cli::pipeline::run_pipeline;
use visits_load::Warehouse;
use visits_state::{JsonFileStore, RunStateStore};

use crate::cli::{ConfigArgs, MetricsArgs};
use crate::summary::{print_metrics, print_run_summary, print_state};

/// Run the pipeline and print its summary. Returns whether the run published.
pub fn run_etl(args: &ConfigArgs) -> Result<bool> {
    let config = load_config(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    let summary = run_pipeline(&config)?;
    print_run_summary(&summary);
    Ok(summary.is_published())
}

pub fn show_metrics(args: &MetricsArgs) -> Result<()> {
    let config = load_config(&args.config.config)
        .with_context(|| format!("load config {}", args.config.config.display()))?;
    let db = &config.paths.sqlite_db;
    if !db.exists() {
        println!("No warehouse at {} yet; run `visits-etl run` first.", db.display());
        return Ok(());
    }
    let warehouse =
        Warehouse::open(db).with_context(|| format!("open {}", db.display()))?;
    let metrics = warehouse
        .daily_metrics(args.limit)
        .context("read daily metrics")?;
    print_metrics(&metrics);
    Ok(())
}

pub fn show_state(args: &ConfigArgs) -> Result<()> {
    let config = load_config(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    let store = JsonFileStore::new(&config.paths.state_file);
    let state = store.load().context("load run state")?;
    print_state(store.path(), state.as_ref());
    Ok(())
}
