//! Human and JSON rendering of pass reports and dry-run plans.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use roster_sync::{Action, Mode, PassReport, PlannedRow, RowOutcome, RowResult};

/// Sheet rows are 1-based with one header row.
fn sheet_row(row_index: usize) -> usize {
    row_index + 2
}

#[derive(Tabled)]
struct ReportTableRow {
    #[tabled(rename = "row")]
    row: usize,
    #[tabled(rename = "login")]
    login: String,
    #[tabled(rename = "repository")]
    resource: String,
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "result")]
    result: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

#[derive(Tabled)]
struct PlanTableRow {
    #[tabled(rename = "row")]
    row: usize,
    #[tabled(rename = "login")]
    login: String,
    #[tabled(rename = "repository")]
    resource: String,
    #[tabled(rename = "current status")]
    status: String,
    #[tabled(rename = "action")]
    action: String,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    mode: Mode,
    dry_run: bool,
    rows: &'a [PlannedRow],
}

pub fn print_report_json(report: &PassReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to serialize pass report")?
    );
    Ok(())
}

pub fn print_plan_json(mode: Mode, plan: &[PlannedRow]) -> Result<()> {
    let payload = PlanJson {
        mode,
        dry_run: true,
        rows: plan,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan")?
    );
    Ok(())
}

pub fn print_report(report: &PassReport) {
    let s = &report.summary;
    let elapsed = report.finished_at - report.started_at;
    println!(
        "Roster {} | {} rows | {} created | {} verified | {} already OK | {} failed | {} invalid | {:.1}s",
        report.mode,
        s.rows,
        s.created,
        s.verified,
        s.converged,
        s.failed,
        s.invalid,
        elapsed.num_milliseconds() as f64 / 1000.0,
    );
    println!(
        "Started {}",
        report
            .started_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
    );

    let visible: Vec<&RowOutcome> = report
        .rows
        .iter()
        .filter(|r| r.result != RowResult::Converged)
        .collect();
    if visible.is_empty() {
        println!("{} nothing to do", "✓".green());
        return;
    }

    let rows: Vec<ReportTableRow> = visible
        .into_iter()
        .map(|r| ReportTableRow {
            row: sheet_row(r.row_index),
            login: r.login.clone().unwrap_or_default(),
            resource: r.resource.clone().unwrap_or_default(),
            action: r.action.to_string(),
            result: result_label(&r.result),
            status: r
                .status_written
                .map(|s| s.as_cell().to_string())
                .unwrap_or_else(|| "-".to_string()),
            detail: result_detail(r),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if s.failed > 0 && report.mode == Mode::Provision {
        println!("Rows marked PROCESSING are deleted and recreated on the next `roster provision`.");
    }
}

pub fn print_plan(mode: Mode, plan: &[PlannedRow]) {
    println!("[dry-run] roster {mode} | {} rows", plan.len());
    if plan.is_empty() {
        println!("No data rows in the sheet.");
        return;
    }
    let rows: Vec<PlanTableRow> = plan
        .iter()
        .map(|p| PlanTableRow {
            row: sheet_row(p.row_index),
            login: p.login.clone().unwrap_or_default(),
            resource: p.resource.clone().unwrap_or_default(),
            status: p
                .status
                .map(|s| s.to_string())
                .or_else(|| p.reason.clone())
                .unwrap_or_default(),
            action: action_label(p.action),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn action_label(action: Action) -> String {
    match action {
        Action::Skip => action.to_string().bright_black().to_string(),
        Action::Create | Action::Verify => action.to_string().green().to_string(),
        Action::DeleteAndRecreate => action.to_string().yellow().to_string(),
        Action::Invalid => action.to_string().red().to_string(),
    }
}

fn result_label(result: &RowResult) -> String {
    match result {
        RowResult::Converged => "OK".bright_black().to_string(),
        RowResult::Created => "CREATED".green().bold().to_string(),
        RowResult::Recreated => "RECREATED".green().bold().to_string(),
        RowResult::Verified => "VERIFIED".green().bold().to_string(),
        RowResult::CreateFailed { .. } => "CREATE FAILED".red().bold().to_string(),
        RowResult::VerifyFailed { .. } => "INVALID LOGIN".red().bold().to_string(),
        RowResult::Invalid { .. } => "SKIPPED".magenta().to_string(),
    }
}

fn result_detail(row: &RowOutcome) -> String {
    let mut parts = Vec::new();
    match &row.result {
        RowResult::CreateFailed { reason }
        | RowResult::VerifyFailed { reason }
        | RowResult::Invalid { reason } => parts.push(reason.clone()),
        _ => {}
    }
    if let Some(err) = &row.delete_error {
        parts.push(format!("delete: {err}"));
    }
    if row.write_attempts > 1 {
        parts.push(format!("{} write attempts", row.write_attempts));
    }
    parts.join("; ")
}
