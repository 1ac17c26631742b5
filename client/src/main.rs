use std::str::FromStr;

use clap::Parser;
use tracing::Level;

use crate::commands::{handle_inspect_command, InspectCommands};

mod commands;

/// Inspect canonical tx block bytes
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: InspectCommands,
    /// Maximum log level (error, warn, info, debug, trace)
    #[clap(long, default_value_t = String::from("info"))]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = Cli::parse();

    //logging
    let level = Level::from_str(&cli.log_level).map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    handle_inspect_command(cli.command)
}
