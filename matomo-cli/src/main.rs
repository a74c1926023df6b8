//! Matomo Track CLI - Command-line interface
//!
//! Sends single tracking hits to a Matomo deployment.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use matomo_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "matomo-track")]
#[command(about = "Send tracking hits to a Matomo tracker")]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    /// Directory for a full trace log of this run
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.log_dir.as_deref())?;

    if let Err(e) = commands::handle_command(&cli.global, cli.command).await {
        tracing::debug!("Command failed: {}", e);
        eprintln!("error: {}", e.user_message());
        std::process::exit(if e.is_user_error() { 2 } else { 1 });
    }

    Ok(())
}
