use crate::cli::{Cli, Commands};
use crate::commands::AppContext;
use crate::error::CliError;
use crate::session::JsonSessionStore;
use reckon_core::config;

pub mod cli;
pub mod commands;
pub mod error;
pub mod session;

pub fn run(cli: Cli) -> Result<(), CliError> {
    let result = dispatch(cli);
    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = config::load_config()?;
    let store = JsonSessionStore::default_location()?;
    let connect = || AppContext::connect(cli.workspace.as_deref(), &config, &store);

    match cli.command {
        Commands::Workspace(args) => commands::workspace::handle_workspace(args, &store),
        Commands::Prices(args) => commands::prices::handle_prices(args, &config),
        Commands::Stats(args) => commands::stats::handle_stats(args, &connect()?),
        Commands::Status(args) => commands::status::handle_status(args, &connect()?),
        Commands::Patch(args) => commands::patch::handle_patch(args, &connect()?),
        Commands::Submissions(args) => {
            commands::submissions::handle_submissions(args, &connect()?, &store)
        }
        Commands::History(args) => commands::history::handle_history(args, &connect()?),
        Commands::Wait(args) => commands::wait::handle_wait(args, &connect()?, &store),
    }
}
