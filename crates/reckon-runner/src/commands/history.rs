use crate::cli::HistoryArgs;
use crate::commands::{table, AppContext};
use crate::error::CliError;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_client::client::OutputRecord;

pub fn handle_history(args: HistoryArgs, context: &AppContext) -> Result<(), CliError> {
    println!(
        "- Collecting outputs of '{}' for {} in {}...",
        args.configuration.cyan(),
        args.entity.cyan(),
        context.workspace.to_string().cyan()
    );
    let HistoryArgs {
        configuration,
        entity,
    } = args;
    let history = context.with_progress(move |client, workspace| async move {
        client
            .output_history(&workspace, &configuration, &entity)
            .await
    })?;

    if history.runs.is_empty() {
        println!("No succeeded submissions found.");
    } else {
        println!("{}", output_table(&history.runs));
    }
    for skipped in &history.skipped {
        println!("  {} {}: {}", "SKIP".yellow().bold(), skipped.id, skipped.reason);
    }
    Ok(())
}

pub(crate) fn output_table(runs: &[OutputRecord]) -> Table {
    let mut t = table(&["Submitted", "Submission", "Output", "Value"]);
    for run in runs {
        let submitted = run.submitted_at.format("%Y-%m-%d %H:%M").to_string();
        if run.outputs.is_empty() {
            t.add_row(vec![
                Cell::new(&submitted),
                Cell::new(&run.submission_id).fg(Color::Yellow),
                Cell::new("-"),
                Cell::new("(no outputs recorded)"),
            ]);
        }
        for (key, value) in &run.outputs {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            t.add_row(vec![
                Cell::new(&submitted),
                Cell::new(&run.submission_id).fg(Color::Yellow),
                Cell::new(key),
                Cell::new(value),
            ]);
        }
    }
    t
}
