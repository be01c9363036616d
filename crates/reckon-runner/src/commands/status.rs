use crate::cli::StatusArgs;
use crate::commands::{status_cell, table, AppContext};
use crate::error::CliError;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_client::client::{StatusReport, TaskStateReport};
use reckon_core::model::WorkflowStatus;
use std::collections::{BTreeMap, BTreeSet};

pub fn handle_status(args: StatusArgs, context: &AppContext) -> Result<(), CliError> {
    println!(
        "- Resolving latest executions of '{}' in {}...",
        args.configuration.cyan(),
        context.workspace.to_string().cyan()
    );
    let configuration = args.configuration.clone();
    let kind = args.entity_type;

    if args.tasks {
        let include_succeeded = args.all;
        let report = context.with_progress(move |client, workspace| async move {
            client
                .task_states(&workspace, &configuration, kind, include_succeeded)
                .await
        })?;
        println!("{}", status_line(&report.status_counts));
        if report.states.is_empty() {
            println!("No entities to show.");
        } else {
            println!("{}", task_state_table(&report));
            println!("{}", task_summary_table(&report));
            for line in stderr_lines(&report) {
                println!("{}", line);
            }
        }
        for failure in &report.failures {
            println!("  {} {}: {}", "SKIP".yellow().bold(), failure.id, failure.reason);
        }
        return Ok(());
    }

    let report = context.with_progress(move |client, workspace| async move {
        client
            .entity_statuses(&workspace, Some(configuration.as_str()), kind)
            .await
    })?;
    if report.resolution.is_empty() {
        println!("No executions of '{}' found.", args.configuration);
    } else {
        println!("{}", entity_table(&report));
    }
    println!("{}", status_line(&report.counts()));
    for skipped in &report.skipped {
        println!("  {} {}: {}", "SKIP".yellow().bold(), skipped.id, skipped.reason);
    }
    Ok(())
}

pub(crate) fn status_line(counts: &BTreeMap<WorkflowStatus, usize>) -> String {
    let parts: Vec<String> = WorkflowStatus::ALL
        .iter()
        .filter_map(|status| {
            let n = counts.get(status).copied().unwrap_or(0);
            (n > 0).then(|| {
                let label = format!("{} {}", n, status);
                match status {
                    WorkflowStatus::Succeeded => label.green().to_string(),
                    WorkflowStatus::Failed => label.red().to_string(),
                    WorkflowStatus::Running => label.yellow().to_string(),
                    _ => label.dimmed().to_string(),
                }
            })
        })
        .collect();
    if parts.is_empty() {
        "  --- no executions".to_string()
    } else {
        format!("  --- {}", parts.join(" | "))
    }
}

pub(crate) fn entity_table(report: &StatusReport) -> Table {
    let mut t = table(&[
        "Entity",
        "Type",
        "Status",
        "Submitted",
        "Submission",
        "Workflow",
    ]);
    for record in report.resolution.records.values() {
        t.add_row(vec![
            Cell::new(&record.entity_id),
            Cell::new(record.entity_kind),
            status_cell(record.status),
            Cell::new(record.submitted_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&record.submission_id),
            Cell::new(record.workflow_id.as_deref().unwrap_or("-")),
        ]);
    }
    t
}

pub(crate) fn stderr_lines(report: &TaskStateReport) -> Vec<String> {
    report
        .stderr
        .iter()
        .flat_map(|(entity, logs)| {
            logs.iter()
                .map(move |(task, path)| format!("  {} {}:{} stderr: {}", "!".red().bold(), entity, task, path))
        })
        .collect()
}

fn state_cell(state: &str) -> Cell {
    let cell = Cell::new(state);
    match state {
        "Done" => cell.fg(Color::Green),
        "Failed" => cell.fg(Color::Red),
        "Running" => cell.fg(Color::Yellow),
        _ => cell.fg(Color::DarkGrey),
    }
}

pub(crate) fn task_state_table(report: &TaskStateReport) -> Table {
    let mut headers = vec!["Entity"];
    headers.extend(report.tasks.iter().map(String::as_str));
    let mut t = table(&headers);
    for (entity, states) in &report.states {
        let mut row = vec![Cell::new(entity)];
        row.extend(
            report
                .tasks
                .iter()
                .map(|task| state_cell(states.get(task).map(String::as_str).unwrap_or("-"))),
        );
        t.add_row(row);
    }
    t
}

pub(crate) fn task_summary_table(report: &TaskStateReport) -> Table {
    let states: BTreeSet<&str> = report
        .summary
        .values()
        .flat_map(|counts| counts.keys().map(String::as_str))
        .collect();
    let mut headers = vec!["Task"];
    headers.extend(states.iter().copied());
    let mut t = table(&headers);
    for task in &report.tasks {
        let counts = report.summary.get(task);
        let mut row = vec![Cell::new(task)];
        row.extend(states.iter().map(|state| {
            Cell::new(
                counts
                    .and_then(|c| c.get(*state))
                    .copied()
                    .unwrap_or(0),
            )
        }));
        t.add_row(row);
    }
    t
}
