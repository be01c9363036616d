use crate::cli::WaitArgs;
use crate::commands::{save_session, AppContext};
use crate::error::CliError;
use crate::session::SessionStore;
use colored::Colorize;
use reckon_client::client::WaitOutcome;
use reckon_client::error::ClientError;
use tokio_util::sync::CancellationToken;

pub fn handle_wait(
    args: WaitArgs,
    context: &AppContext,
    store: &dyn SessionStore,
) -> Result<(), CliError> {
    let submission_ids = match args.submission_id {
        Some(id) => vec![id],
        None => store.load()?.pending_for(&context.workspace),
    };
    if submission_ids.is_empty() {
        println!(
            "No pending submissions for {}. Record them with '{}'.",
            context.workspace,
            "reckon submissions --active".cyan()
        );
        return Ok(());
    }

    wait_each(
        submission_ids,
        |submission_id| {
            println!(
                "- Waiting for submission {} in {}...",
                submission_id.cyan(),
                context.workspace.to_string().cyan()
            );
            let id = submission_id.to_string();
            let max_polls = args.max_polls;
            context.with_progress(move |client, workspace| async move {
                let token = CancellationToken::new();
                let on_interrupt = token.clone();
                let listener = tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Interrupted; stopping the wait");
                        on_interrupt.cancel();
                    }
                });
                let outcome = client
                    .wait_for_submission(&workspace, &id, max_polls, &token)
                    .await;
                listener.abort();
                outcome
            })
        },
        |submission_id| {
            let workspace = context.workspace.clone();
            save_session(store, |session| {
                session.remove_pending(&workspace, submission_id)
            })
        },
    )
}

/// Waits on each submission in turn. A failed wait is reported and the rest still run;
/// an interrupt stops the whole batch.
pub(crate) fn wait_each<W, F>(
    submission_ids: Vec<String>,
    mut wait: W,
    mut finished: F,
) -> Result<(), CliError>
where
    W: FnMut(&str) -> Result<WaitOutcome, CliError>,
    F: FnMut(&str) -> Result<(), CliError>,
{
    let total = submission_ids.len();
    let mut failed = 0;
    for submission_id in &submission_ids {
        match wait(submission_id) {
            Ok(outcome) => {
                println!("{}", outcome_line(&outcome));
                finished(submission_id)?;
            }
            Err(CliError::Client(ClientError::Cancelled)) => {
                return Err(ClientError::Cancelled.into());
            }
            Err(e) => {
                tracing::error!("Waiting for submission {} failed: {}", submission_id, e);
                println!("  {} {}: {}", "FAIL".red().bold(), submission_id, e);
                failed += 1;
            }
        }
    }
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::PartialFailure { failed, total })
    }
}

pub(crate) fn outcome_line(outcome: &WaitOutcome) -> String {
    let parts: Vec<String> = outcome
        .statuses
        .iter()
        .map(|(status, n)| format!("{} {}", n, status))
        .collect();
    format!(
        "{} {} finished after {} polls: {}",
        "OK".green().bold(),
        outcome.submission_id,
        outcome.polls,
        parts.join(", ")
    )
}
