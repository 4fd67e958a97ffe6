//! dormant - lifecycle passes for stale computer accounts
//!
//! - `dormant run` classifies aging computer accounts, applies the
//!   transitions that are not in report-only mode and publishes the report
//! - `dormant check` verifies the directory connection and holding location

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod error;
mod logging;

use error::CliResult;
use logging::LogFormat;

/// Move, disable and remove computer accounts that stopped checking in
#[derive(Parser)]
#[command(name = "dormant")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Log level or filter directive; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one lifecycle pass
    Run(commands::run::RunArgs),

    /// Check directory access and holding location resolution
    Check(commands::check::CheckArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(code = e.exit_code(), error = %e, "Command failed");
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    logging::init_logging(cli.log_format, &cli.log_level)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Check(args) => commands::check::execute(args).await,
    }
}
