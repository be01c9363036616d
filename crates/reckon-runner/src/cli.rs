use clap::{Args, Parser, Subcommand};
use reckon_core::model::EntityKind;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Execution status, cost and output repair for workflow platform workspaces.",
    long_about = "This tool reads a workspace's submission history from the workflow platform, resolves the latest execution of each entity, estimates runtime and cost, and writes back outputs that failed executions left behind."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short,
        long,
        global = true,
        help = "Workspace as 'namespace/workspace' or a saved alias"
    )]
    pub workspace: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity level (-v for debug, -vv for trace)")]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Runtime, CPU hours and estimated cost of succeeded executions")]
    Stats(StatsArgs),

    #[command(about = "Latest execution status of every entity")]
    Status(StatusArgs),

    #[command(about = "Write back outputs of finished tasks that never reached their entity")]
    Patch(PatchArgs),

    #[command(about = "List submissions")]
    Submissions(SubmissionsArgs),

    #[command(about = "Outputs of every succeeded submission for one entity")]
    History(HistoryArgs),

    #[command(about = "Wait for submissions to finish")]
    Wait(WaitArgs),

    #[command(about = "Manage workspace aliases")]
    Workspace(WorkspaceArgs),

    #[command(about = "Show the loaded price table")]
    Prices(PricesArgs),
}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(help = "Method configuration name (substring match)")]
    pub configuration: String,

    #[arg(long, help = "Print the per-task breakdown of every execution")]
    pub tasks: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    #[arg(help = "Method configuration name (substring match)")]
    pub configuration: String,

    #[arg(long, help = "Only report entities of this type")]
    pub entity_type: Option<EntityKind>,

    #[arg(long, help = "Print per-task execution states of unfinished entities")]
    pub tasks: bool,

    #[arg(long, requires = "tasks", help = "Include succeeded entities in the task view")]
    pub all: bool,
}

#[derive(Args)]
pub struct PatchArgs {
    #[arg(help = "Namespace of the method configuration")]
    pub config_namespace: String,

    #[arg(help = "Method configuration name")]
    pub configuration: String,

    #[arg(long, default_value = "sample", help = "Entity type the configuration writes to")]
    pub entity_type: EntityKind,

    #[arg(long, help = "Show the planned writes without applying them")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct SubmissionsArgs {
    #[arg(long, help = "Only submissions with running or queued workflows")]
    pub active: bool,

    #[arg(long = "config", help = "Filter by method configuration name (substring match)")]
    pub configuration: Option<String>,

    #[arg(long, help = "Filter by submission entity name")]
    pub entity: Option<String>,

    #[arg(long, help = "Filter by submission id")]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(help = "Method configuration name (substring match)")]
    pub configuration: String,

    #[arg(help = "Entity name")]
    pub entity: String,
}

#[derive(Args)]
pub struct WaitArgs {
    #[arg(help = "Submission id (defaults to the pending submissions of the workspace)")]
    pub submission_id: Option<String>,

    #[arg(long, help = "Give up after this many polls")]
    pub max_polls: Option<u32>,
}

#[derive(Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub action: WorkspaceAction,
}

#[derive(Subcommand)]
pub enum WorkspaceAction {
    #[command(about = "Save an alias for a workspace")]
    Add {
        alias: String,
        #[arg(value_name = "NAMESPACE/WORKSPACE")]
        target: String,
    },
    #[command(about = "List saved aliases and pending submissions")]
    List,
    #[command(about = "Remove an alias")]
    Remove { alias: String },
}

#[derive(Args)]
pub struct PricesArgs {
    #[arg(long, help = "Only show one machine class")]
    pub machine: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_patch() {
        let cli = Cli::parse_from([
            "reckon",
            "patch",
            "broad",
            "rnaseq",
            "-w",
            "broad/rnaseq-2024",
            "--entity-type",
            "sample_set",
            "--dry-run",
        ]);
        assert_eq!(cli.workspace.as_deref(), Some("broad/rnaseq-2024"));
        match cli.command {
            Commands::Patch(args) => {
                assert_eq!(args.entity_type, EntityKind::SampleSet);
                assert!(args.dry_run);
            }
            _ => panic!("expected patch"),
        }
    }

    #[test]
    fn test_unknown_entity_type_is_rejected() {
        let parsed = Cli::try_parse_from(["reckon", "status", "rnaseq", "--entity-type", "cohort"]);
        assert!(parsed.is_err());
    }
}
