//! `landshift export` - write the joined inference table as CSV.

use std::path::PathBuf;

use clap::Args;

use super::{build_analysis, load_config, read_ring};
use crate::error::CliError;

/// Arguments for the `export` command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// JSON file with the polygon ring as [[lon, lat], ...]
    #[arg(long)]
    pub polygon: PathBuf,

    /// Analysis year
    #[arg(long)]
    pub year: i32,

    /// Output CSV path
    #[arg(long)]
    pub output: PathBuf,
}

/// Run the `export` command.
pub fn run(args: ExportArgs, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let analysis = build_analysis(&config)?;
    let ring = read_ring(&args.polygon)?;

    let table = analysis.inference_table(&ring, args.year)?;
    landshift::export::export_csv(&table, &args.output)?;

    if table.is_placeholder() {
        println!(
            "No measurable change for {}; wrote placeholder row to {}",
            args.year,
            args.output.display()
        );
    } else {
        println!(
            "Wrote {} rows ({} columns) to {}",
            table.len(),
            table.schema().len(),
            args.output.display()
        );
    }

    Ok(())
}
