//! Ebbtide CLI - command-line shell over the session layer.
//!
//! Runs against the in-process simulation engine; useful for demos and for
//! exercising the session facade end to end.

mod commands;

use clap::Parser;
use ebbtide_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "ebbtide")]
#[command(about = "Session-level torrent management")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None)?;
    commands::handle_command(cli.command).await?;
    Ok(())
}
