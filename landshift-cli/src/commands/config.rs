//! `landshift config` - view configuration.

use std::path::PathBuf;

use clap::Subcommand;

use landshift::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    match command {
        ConfigCommands::List => run_list(config_path),
        ConfigCommands::Path => run_path(),
    }
}

fn run_list(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(&path)?,
        None => ConfigFile::load()?,
    };

    println!("[backend]");
    if config.backend.endpoint.is_empty() {
        println!("  endpoint = (not set)");
    } else {
        println!("  endpoint = {}", config.backend.endpoint);
    }
    match &config.backend.api_key {
        Some(_) => println!("  api_key = (set)"),
        None => println!("  api_key = (not set)"),
    }
    println!("  timeout_secs = {}", config.backend.timeout_secs);
    println!();
    println!("[analysis]");
    println!("  area_ceiling_m2 = {}", config.analysis.area_ceiling_m2);
    println!("  scale_m = {}", config.analysis.scale_m);
    println!();
    println!("[retry]");
    println!("  max_attempts = {}", config.retry.max_attempts);
    println!("  initial_delay_ms = {}", config.retry.initial_delay_ms);

    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
