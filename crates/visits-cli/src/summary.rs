use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use visits_cli::pipeline::{RunOutcome, RunSummary};
use visits_load::DailyMetric;
use visits_model::{CheckResult, RunState, Severity};

pub fn print_run_summary(summary: &RunSummary) {
    println!("Snapshot: {}", summary.source.raw_snapshot.display());
    println!("SHA-256: {}", summary.source.sha256);
    println!("Quality report: {}", summary.report_paths.stamped.display());

    let staged = summary.outcome.staged();
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Raw"), Cell::new(staged.raw_rows)]);
    table.add_row(vec![
        Cell::new("Outside watermark window"),
        count_cell(staged.filtered_out(), Color::DarkGrey),
    ]);
    table.add_row(vec![
        Cell::new("Rejected"),
        count_cell(staged.rejected.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Duplicates dropped"),
        count_cell(staged.duplicates_dropped, Color::DarkGrey),
    ]);
    table.add_row(vec![
        Cell::new("Accepted").add_attribute(Attribute::Bold),
        Cell::new(staged.accepted.len()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_check_table(&summary.outcome.report().checks);

    match &summary.outcome {
        RunOutcome::Published(_) => {
            if let Some(path) = &summary.clean_path {
                println!("Staging clean: {}", path.display());
            }
            if let (Some(mode), Some(stats)) = (summary.load_mode, summary.load_stats) {
                println!(
                    "Warehouse ({mode:?}): {} inserted, {} replaced, {} skipped",
                    stats.inserted, stats.replaced, stats.skipped
                );
            }
            println!("Status: PUBLISHED");
        }
        RunOutcome::Blocked(run) => {
            println!("Staging rejects: {}", summary.rejects_path.display());
            eprintln!("Status: BLOCKED");
            for check in run.report.blocking_failures() {
                eprintln!("- {}: {}", check.name, check.details);
            }
        }
    }
    if let Some(state) = &summary.saved_state {
        println!(
            "Run state: last_row_count={} watermark={}",
            state.last_row_count,
            format_watermark(state)
        );
    }
}

fn print_check_table(checks: &[CheckResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Severity"),
        header_cell("Result"),
        header_cell("Details"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Center);
    for check in checks {
        table.add_row(vec![
            Cell::new(check.name),
            severity_cell(check.severity),
            result_cell(check),
            Cell::new(&check.details),
        ]);
    }
    println!("{table}");
}

pub fn print_metrics(metrics: &[DailyMetric]) {
    if metrics.is_empty() {
        println!("No daily metrics yet.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Visit date"),
        header_cell("Visits"),
        header_cell("Avg cost"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for metric in metrics {
        let date = match metric.visit_date {
            Some(date) => Cell::new(date),
            None => dim_cell("(none)"),
        };
        let avg = match metric.avg_visit_cost {
            Some(avg) => Cell::new(format!("{avg:.2}")),
            None => dim_cell("-"),
        };
        table.add_row(vec![date, Cell::new(metric.visit_count), avg]);
    }
    println!("{table}");
}

pub fn print_state(path: &Path, state: Option<&RunState>) {
    println!("State file: {}", path.display());
    match state {
        Some(state) => {
            let mut table = Table::new();
            table.set_header(vec![header_cell("Key"), header_cell("Value")]);
            apply_table_style(&mut table);
            table.add_row(vec![Cell::new("last_row_count"), Cell::new(state.last_row_count)]);
            table.add_row(vec![Cell::new("watermark"), Cell::new(format_watermark(state))]);
            println!("{table}");
        }
        None => println!("No run state yet (first run)."),
    }
}

fn format_watermark(state: &RunState) -> String {
    state
        .watermark
        .map_or_else(|| "-".to_string(), |ts| ts.to_rfc3339())
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Fail => Color::Red,
        Severity::Warn => Color::Yellow,
    };
    Cell::new(severity.label()).fg(color)
}

fn result_cell(check: &CheckResult) -> Cell {
    if check.passed {
        Cell::new("pass").fg(Color::Green)
    } else {
        let color = match check.severity {
            Severity::Fail => Color::Red,
            Severity::Warn => Color::Yellow,
        };
        Cell::new("fail").fg(color).add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
