pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "dramwise",
    about = "Dramwise operator CLI",
    long_about = "Operate dramwise runtime readiness, config inspection, and one-shot recommendation runs.",
    after_help = "Examples:\n  dramwise doctor --json\n  dramwise config\n  dramwise recommend --payload request.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, completion credentials, and catalog integrity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run the recommendation pipeline once for a JSON preference payload")]
    Recommend {
        #[arg(long, help = "Path to the payload file; reads stdin when omitted")]
        payload: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Recommend { payload } => commands::recommend::run(payload.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
