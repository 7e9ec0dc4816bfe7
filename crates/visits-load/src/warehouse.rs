//! SQLite warehouse: staging table plus derived analytics tables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info};

use visits_model::{Dataset, VisitRecord};

use crate::error::{LoadError, Result, sql};
use crate::frame::{format_date, format_timestamp};

pub const STAGING_TABLE: &str = "stg_patient_visits";

/// How a publish is written to the staging table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Drop and recreate the table from the published set (full refresh).
    Replace,
    /// Insert new visits and replace existing ones by `visit_id` unless the
    /// stored row has a newer `last_updated` (incremental runs).
    Upsert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub inserted: usize,
    pub replaced: usize,
    /// Incoming rows older than what the warehouse already holds.
    pub skipped: usize,
}

/// One row of `daily_visit_metrics`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMetric {
    pub visit_date: Option<NaiveDate>,
    pub visit_count: u64,
    pub avg_visit_cost: Option<f64>,
}

const CREATE_STAGING: &str = "CREATE TABLE IF NOT EXISTS stg_patient_visits (
    visit_id TEXT,
    patient_id TEXT,
    provider_id TEXT,
    diagnosis_code TEXT,
    visit_date TEXT,
    visit_cost REAL,
    last_updated TEXT
)";

const INSERT_STAGING: &str = "INSERT INTO stg_patient_visits
    (visit_id, patient_id, provider_id, diagnosis_code, visit_date, visit_cost, last_updated)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const BUILD_ANALYTICS: &str = "
DROP TABLE IF EXISTS fact_visits;
CREATE TABLE fact_visits AS
SELECT visit_id, patient_id, provider_id, diagnosis_code, visit_date, visit_cost, last_updated
FROM stg_patient_visits;
DROP TABLE IF EXISTS daily_visit_metrics;
CREATE TABLE daily_visit_metrics AS
SELECT visit_date, COUNT(*) AS visit_count, AVG(visit_cost) AS avg_visit_cost
FROM fact_visits
GROUP BY visit_date;
";

/// A connection to the warehouse database.
pub struct Warehouse {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Warehouse {
    /// Open (or create) the database file, creating its directory if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LoadError::Io {
                operation: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| LoadError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the published set to the staging table in one transaction.
    pub fn load_staging(&mut self, dataset: &Dataset, mode: LoadMode) -> Result<LoadStats> {
        let start = Instant::now();
        let tx = self.conn.transaction().map_err(sql("begin transaction"))?;
        let stats = match mode {
            LoadMode::Replace => replace_all(&tx, dataset)?,
            LoadMode::Upsert => upsert(&tx, dataset)?,
        };
        tx.commit().map_err(sql("commit"))?;
        info!(
            table = STAGING_TABLE,
            mode = ?mode,
            inserted = stats.inserted,
            replaced = stats.replaced,
            skipped = stats.skipped,
            duration_ms = start.elapsed().as_millis(),
            "staging table loaded"
        );
        Ok(stats)
    }

    /// Rebuild `fact_visits` and `daily_visit_metrics` from the staging table.
    pub fn build_analytics_tables(&mut self) -> Result<()> {
        let tx = self.conn.transaction().map_err(sql("begin transaction"))?;
        tx.execute_batch(CREATE_STAGING)
            .map_err(sql("create staging table"))?;
        tx.execute_batch(BUILD_ANALYTICS)
            .map_err(sql("build analytics tables"))?;
        tx.commit().map_err(sql("commit"))?;
        info!("analytics tables rebuilt: fact_visits, daily_visit_metrics");
        Ok(())
    }

    pub fn staging_row_count(&self) -> Result<u64> {
        self.count_rows(STAGING_TABLE)
    }

    pub fn fact_row_count(&self) -> Result<u64> {
        self.count_rows("fact_visits")
    }

    fn count_rows(&self, table: &'static str) -> Result<u64> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql("inspect schema"))?;
        if exists.is_none() {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(sql("count rows"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Daily metrics ordered by date, at most `limit` rows.
    ///
    /// Empty when the analytics tables have not been built yet.
    pub fn daily_metrics(&self, limit: Option<usize>) -> Result<Vec<DailyMetric>> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'daily_visit_metrics'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql("inspect schema"))?;
        if exists.is_none() {
            return Ok(Vec::new());
        }

        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = self
            .conn
            .prepare(
                "SELECT visit_date, visit_count, avg_visit_cost
                 FROM daily_visit_metrics
                 ORDER BY visit_date
                 LIMIT ?1",
            )
            .map_err(sql("prepare metrics query"))?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let visit_date: Option<String> = row.get(0)?;
                let visit_count: i64 = row.get(1)?;
                let avg_visit_cost: Option<f64> = row.get(2)?;
                Ok((visit_date, visit_count, avg_visit_cost))
            })
            .map_err(sql("query metrics"))?;

        let mut metrics = Vec::new();
        for row in rows {
            let (visit_date, visit_count, avg_visit_cost) = row.map_err(sql("read metrics row"))?;
            let visit_date = visit_date
                .map(|text| {
                    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
                        LoadError::InvalidStoredValue {
                            column: "visit_date",
                            value: text.clone(),
                        }
                    })
                })
                .transpose()?;
            metrics.push(DailyMetric {
                visit_date,
                visit_count: u64::try_from(visit_count).unwrap_or(0),
                avg_visit_cost,
            });
        }
        debug!(rows = metrics.len(), "daily metrics read");
        Ok(metrics)
    }
}

fn insert(tx: &Transaction<'_>, record: &VisitRecord) -> Result<()> {
    tx.execute(
        INSERT_STAGING,
        params![
            record.visit_id,
            record.patient_id,
            record.provider_id,
            record.diagnosis_code,
            record.visit_date.map(format_date),
            record.visit_cost,
            record.last_updated.map(format_timestamp),
        ],
    )
    .map_err(sql("insert staging row"))?;
    Ok(())
}

fn replace_all(tx: &Transaction<'_>, dataset: &Dataset) -> Result<LoadStats> {
    tx.execute_batch("DROP TABLE IF EXISTS stg_patient_visits")
        .map_err(sql("drop staging table"))?;
    tx.execute_batch(CREATE_STAGING)
        .map_err(sql("create staging table"))?;
    for record in dataset {
        insert(tx, record)?;
    }
    Ok(LoadStats {
        inserted: dataset.len(),
        ..LoadStats::default()
    })
}

fn upsert(tx: &Transaction<'_>, dataset: &Dataset) -> Result<LoadStats> {
    tx.execute_batch(CREATE_STAGING)
        .map_err(sql("create staging table"))?;
    let mut stats = LoadStats::default();
    for record in dataset {
        let Some(visit_id) = record.visit_id.as_deref() else {
            insert(tx, record)?;
            stats.inserted += 1;
            continue;
        };
        let incoming = record.last_updated.map(format_timestamp);

        // A stored row wins only with a strictly newer timestamp; missing
        // timestamps count as oldest.
        let newer_exists: bool = tx
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM stg_patient_visits
                    WHERE visit_id = ?1
                      AND last_updated IS NOT NULL
                      AND (?2 IS NULL OR last_updated > ?2)
                )",
                params![visit_id, incoming],
                |row| row.get(0),
            )
            .map_err(sql("compare staging row"))?;
        if newer_exists {
            stats.skipped += 1;
            continue;
        }

        let removed = tx
            .execute(
                "DELETE FROM stg_patient_visits WHERE visit_id = ?1",
                params![visit_id],
            )
            .map_err(sql("delete staging row"))?;
        insert(tx, record)?;
        if removed > 0 {
            stats.replaced += 1;
        } else {
            stats.inserted += 1;
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_empty_before_first_build() {
        let warehouse = Warehouse::in_memory().unwrap();
        assert!(warehouse.daily_metrics(None).unwrap().is_empty());
        assert_eq!(warehouse.staging_row_count().unwrap(), 0);
    }
}
