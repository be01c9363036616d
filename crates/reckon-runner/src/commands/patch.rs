use crate::cli::PatchArgs;
use crate::commands::{table, AppContext};
use crate::error::CliError;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_client::client::PatchReport;
use reckon_core::patch::RepairSource;

pub fn handle_patch(args: PatchArgs, context: &AppContext) -> Result<(), CliError> {
    println!(
        "- Checking {} outputs of '{}/{}' in {}{}...",
        args.entity_type.to_string().cyan(),
        args.config_namespace.cyan(),
        args.configuration.cyan(),
        context.workspace.to_string().cyan(),
        if args.dry_run { " (dry run)" } else { "" }
    );
    let PatchArgs {
        config_namespace,
        configuration,
        entity_type,
        dry_run,
    } = args;
    let report = context.with_progress(move |client, workspace| async move {
        client
            .patch(
                &workspace,
                &config_namespace,
                &configuration,
                entity_type,
                dry_run,
            )
            .await
    })?;

    println!(
        "- {} entities missing outputs, {} repairable",
        report.incomplete.to_string().bold(),
        report.repairs.len().to_string().bold()
    );
    if report.succeeded_unwritten > 0 {
        println!(
            "{} {} entities succeeded but their outputs were never written",
            "!".yellow().bold(),
            report.succeeded_unwritten
        );
    }
    if !report.repairs.is_empty() {
        println!("{}", repair_table(&report));
        let per_task: Vec<String> = report
            .per_task
            .iter()
            .map(|(task, n)| format!("{} {}", n, task))
            .collect();
        println!("  --- repaired per task: {}", per_task.join(" | "));
    }
    for unresolved in report.unresolved.iter().chain(report.skipped.iter()) {
        println!(
            "  {} {}: {}",
            "SKIP".yellow().bold(),
            unresolved.id,
            unresolved.reason
        );
    }

    if report.dry_run {
        println!("Dry run: no attributes were written.");
        return Ok(());
    }
    for failure in &report.failed_writes {
        println!(
            "  {} {}.{}: {}",
            "FAIL".red().bold(),
            failure.entity_id,
            failure.attribute,
            failure.reason
        );
    }
    let total = report.written + report.failed_writes.len();
    println!(
        "{} Wrote {} of {} attributes.",
        "OK".green().bold(),
        report.written,
        total
    );
    if report.failed_writes.is_empty() {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            failed: report.failed_writes.len(),
            total,
        })
    }
}

pub(crate) fn repair_table(report: &PatchReport) -> Table {
    let mut t = table(&["Entity", "Source", "Attribute", "Value"]);
    for repair in &report.repairs {
        let source = match &repair.source {
            RepairSource::WorkflowOutputs => "workflow outputs".to_string(),
            RepairSource::Task(task) => format!("task {}", task),
        };
        for (attribute, value) in &repair.attributes {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            t.add_row(vec![
                Cell::new(&repair.entity_id).fg(Color::Yellow),
                Cell::new(&source),
                Cell::new(attribute),
                Cell::new(value),
            ]);
        }
    }
    t
}
