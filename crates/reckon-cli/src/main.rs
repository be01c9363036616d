use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use reckon_core::logging::{self, LogLevel};

#[derive(Parser)]
#[command(name = "reckon")]
#[command(about = "Execution status, cost estimation and output repair for workflow platform workspaces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, help = "Print help for all commands recursively")]
    help_all: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Workspace as 'namespace/workspace' or a saved alias"
    )]
    pub workspace: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity level")]
    pub verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Runner(Box<reckon_runner::cli::Commands>),

    #[command(about = "Generate shell completions")]
    Completions(CompletionsArgs),
}

#[derive(Args)]
struct CompletionsArgs {
    #[arg(long, help = "Shell to generate completions for")]
    shell: Shell,
}

fn print_help_all() {
    let cmd = Cli::command();
    print_command_help(&cmd, 0);
}

fn print_command_help(cmd: &clap::Command, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = cmd.get_name();

    if cmd.is_hide_set() {
        return;
    }

    if depth == 0 {
        println!("{}", "=".repeat(60));
        println!("RECKON - Complete Command Reference");
        println!("{}", "=".repeat(60));
        println!();
    } else {
        println!();
        println!("{}{}", indent, "-".repeat(50 - indent.len()));
        println!("{}Command: {}", indent, name);
        println!("{}{}", indent, "-".repeat(50 - indent.len()));
    }

    let mut help_cmd = cmd.clone();
    let help_text = help_cmd.render_help();

    for line in help_text.to_string().lines() {
        println!("{}{}", indent, line);
    }

    for subcmd in cmd.get_subcommands() {
        print_command_help(subcmd, depth + 1);
    }
}

fn init_logging(verbose: u8) {
    logging::set_log_level_from_env();
    match verbose {
        0 => {}
        1 => logging::set_log_level(LogLevel::Debug),
        _ => logging::set_log_level(LogLevel::Trace),
    }

    let logging_config = reckon_core::config::load_config()
        .map(|c| c.logging)
        .unwrap_or_default();

    if let Err(e) = logging::init_session_logger(&logging_config) {
        eprintln!(
            "{}",
            format!("[ERROR] Failed to initialize session logger: {}", e).red()
        );
        logging::init_stderr_logger();
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.help_all {
        print_help_all();
        return;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            return;
        }
    };

    match command {
        Commands::Runner(cmd) => {
            init_logging(cli.verbose);

            let runner_cli = reckon_runner::cli::Cli {
                command: *cmd,
                workspace: cli.workspace,
                verbose: cli.verbose,
            };

            if let Err(e) = reckon_runner::run(runner_cli) {
                eprintln!("{}", format!("[ERROR] {}", e).red());
                std::process::exit(1);
            }
        }
        Commands::Completions(args) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(args.shell, &mut cmd, name, &mut std::io::stdout());
        }
    }
}
