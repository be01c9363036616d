use crate::cli::StatsArgs;
use crate::commands::{hours, money, status_cell, table, AppContext};
use crate::error::CliError;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_client::client::StatsReport;

pub fn handle_stats(args: StatsArgs, context: &AppContext) -> Result<(), CliError> {
    println!(
        "- Collecting executions of '{}' in {}...",
        args.configuration.cyan(),
        context.workspace.to_string().cyan()
    );
    let configuration = args.configuration.clone();
    let report = context.with_progress(move |client, workspace| async move {
        client.stats(&workspace, &configuration).await
    })?;
    let currency = context.client.prices().currency.clone();

    if report.workflows.is_empty() {
        println!("No succeeded executions of '{}'.", args.configuration);
    } else {
        println!("{}", workflow_table(&report, &currency));
    }
    if args.tasks && !report.workflows.is_empty() {
        println!("{}", task_table(&report, &currency));
    }

    let unknown: Vec<String> = report
        .workflows
        .values()
        .flat_map(|w| w.executions.iter())
        .flat_map(|(entity, e)| e.cost_unknown.iter().map(move |t| format!("{}:{}", entity, t)))
        .collect();
    if !unknown.is_empty() {
        println!(
            "{} cost unknown for {} tasks (missing price entries): {}",
            "!".yellow().bold(),
            unknown.len(),
            unknown.join(", ")
        );
    }

    if !report.not_succeeded.is_empty() {
        println!(
            "\n{} entities without a succeeded latest execution:",
            report.not_succeeded.len().to_string().bold()
        );
        let mut t = table(&["Entity", "Status", "Submission"]);
        for record in &report.not_succeeded {
            t.add_row(vec![
                Cell::new(&record.entity_id),
                status_cell(record.status),
                Cell::new(&record.submission_id),
            ]);
        }
        println!("{}", t);
    }

    for failure in report.failures.iter().chain(report.skipped.iter()) {
        println!("  {} {}: {}", "SKIP".yellow().bold(), failure.id, failure.reason);
    }
    Ok(())
}

pub(crate) fn workflow_table(report: &StatsReport, currency: &str) -> Table {
    let mut t = table(&[
        "Workflow",
        "Executions",
        "Max runtime (h)",
        "CPU hours",
        "Estimated cost",
    ]);
    for group in report.workflows.values() {
        t.add_row(vec![
            Cell::new(&group.workflow_name).fg(Color::Yellow),
            Cell::new(group.executions.len()),
            Cell::new(hours(group.max_runtime_h())),
            Cell::new(hours(group.total_cpu_h())),
            Cell::new(money(group.total_cost(), currency)),
        ]);
    }
    t
}

pub(crate) fn task_table(report: &StatsReport, currency: &str) -> Table {
    let mut t = table(&[
        "Entity",
        "Task",
        "Attempts",
        "Billable (h)",
        "All attempts (h)",
        "Longest preemption (h)",
        "Machine",
        "CPU hours",
        "Cost",
    ]);
    for group in report.workflows.values() {
        for (entity, execution) in &group.executions {
            for (task, stats) in &execution.per_task {
                let cost = if stats.cache_hit {
                    "cached".to_string()
                } else {
                    stats
                        .estimated_cost
                        .map(|c| money(c, currency))
                        .unwrap_or_else(|| "?".to_string())
                };
                t.add_row(vec![
                    Cell::new(entity),
                    Cell::new(task),
                    Cell::new(stats.attempt_count),
                    Cell::new(hours(stats.billable_time_h)),
                    Cell::new(hours(stats.total_attempts_time_h)),
                    Cell::new(
                        stats
                            .max_single_preemption_time_h
                            .map(hours)
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::new(stats.last_machine_class.as_deref().unwrap_or("-")),
                    Cell::new(
                        stats
                            .cpu_hours
                            .map(hours)
                            .unwrap_or_else(|| "?".to_string()),
                    ),
                    Cell::new(cost),
                ]);
            }
        }
    }
    t
}
