use crate::cli::SubmissionsArgs;
use crate::commands::{save_session, table, AppContext};
use crate::error::CliError;
use crate::session::SessionStore;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_client::client::SubmissionFilter;
use reckon_core::model::{SubmissionSummary, WorkflowStatus};

pub fn handle_submissions(
    args: SubmissionsArgs,
    context: &AppContext,
    store: &dyn SessionStore,
) -> Result<(), CliError> {
    let filter = SubmissionFilter {
        active_only: args.active,
        configuration: args.configuration,
        entity: args.entity,
        submission_id: args.id,
    };
    let submissions = context.with_progress(move |client, workspace| async move {
        client.submissions(&workspace, &filter).await
    })?;

    if submissions.is_empty() {
        println!("No matching submissions in {}.", context.workspace);
        return Ok(());
    }
    println!("{}", submission_table(&submissions));

    if args.active {
        let workspace = context.workspace.clone();
        let ids: Vec<String> = submissions.iter().map(|s| s.submission_id.clone()).collect();
        let mut added = 0;
        save_session(store, |session| {
            added = session.add_pending(&workspace, ids);
        })?;
        if added > 0 {
            println!(
                "- Tracking {} new active submissions; follow them with '{}'.",
                added.to_string().bold(),
                "reckon wait".cyan()
            );
        }
    }
    Ok(())
}

fn workflow_counts(summary: &SubmissionSummary) -> String {
    WorkflowStatus::ALL
        .iter()
        .filter_map(|status| {
            let n = summary.workflow_count(*status);
            (n > 0).then(|| format!("{}:{}", status, n))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn submission_table(submissions: &[SubmissionSummary]) -> Table {
    let mut t = table(&[
        "Submission",
        "Submitted",
        "Configuration",
        "Entity",
        "Status",
        "Workflows",
    ]);
    for s in submissions {
        let status = Cell::new(&s.status);
        t.add_row(vec![
            Cell::new(&s.submission_id).fg(Color::Yellow),
            Cell::new(s.submission_date.format("%Y-%m-%d %H:%M")),
            Cell::new(s.qualified_configuration()),
            Cell::new(format!(
                "{} ({})",
                s.submission_entity.entity_name, s.submission_entity.entity_type
            )),
            if s.is_active() {
                status.fg(Color::Yellow)
            } else {
                status
            },
            Cell::new(workflow_counts(s)),
        ]);
    }
    t
}
