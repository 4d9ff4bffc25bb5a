pub mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;
use tracing::Level;

use crate::commands::simulate::SimulateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "ticketroute",
    about = "Ticketroute operator CLI",
    long_about = "Operate the ticket routing engine: migrations, demo data, config inspection, readiness checks, and dry-run routing decisions.",
    after_help = "Examples:\n  ticketroute migrate\n  ticketroute seed\n  ticketroute doctor --json\n  ticketroute simulate --context ticket.json --actor dispatcher-1 --company company-demo-001"
)]
pub struct Cli {
    /// Log to stderr; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo contract, teams, and routing rules")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a routing decision for a ticket context without assigning it")]
    Simulate(SimulateArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(*json),
        Command::Simulate(args) => commands::simulate::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Stdout carries the JSON payload, so log lines go to stderr.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .compact()
        .try_init();
}
