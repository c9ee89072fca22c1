//! Landshift CLI - command-line interface
//!
//! Drives the land-cover change pipeline from the terminal: per-category
//! changed area, CSV export of the joined inference table, polygon
//! pre-flight checks, and configuration inspection.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::{area, check, config, export};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "landshift", version, about = "Land-cover change and carbon-signal analysis")]
struct Cli {
    /// Use an explicit configuration file instead of the default path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Per-category changed area for a polygon and year
    Area(area::AreaArgs),

    /// Export the joined inference table as CSV
    Export(export::ExportArgs),

    /// Validate a polygon against the processing ceiling
    Check(check::CheckArgs),

    /// View configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() {
    landshift::logging::init();

    let cli = Cli::parse();
    tracing::debug!(config = ?cli.config, "Starting landshift CLI");

    let result: Result<(), CliError> = match cli.command {
        Commands::Area(args) => area::run(args, cli.config),
        Commands::Export(args) => export::run(args, cli.config),
        Commands::Check(args) => check::run(args, cli.config),
        Commands::Config { command } => config::run(command, cli.config),
    };

    if let Err(error) = result {
        eprintln!("error: {}", error);
        process::exit(error.exit_code());
    }
}
