//! `landshift area` - per-category changed area for a polygon and year.

use std::path::PathBuf;

use clap::Args;

use super::{build_analysis, format_area, load_config, read_ring};
use crate::error::CliError;

/// Arguments for the `area` command.
#[derive(Debug, Args)]
pub struct AreaArgs {
    /// JSON file with the polygon ring as [[lon, lat], ...]
    #[arg(long)]
    pub polygon: PathBuf,

    /// Analysis year
    #[arg(long)]
    pub year: i32,
}

/// Run the `area` command.
pub fn run(args: AreaArgs, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let analysis = build_analysis(&config)?;
    let ring = read_ring(&args.polygon)?;

    let summary = analysis.area_of_change(&ring, args.year)?;

    if summary.is_empty() {
        println!("No measurable change detected for {}.", args.year);
        return Ok(());
    }

    println!("Changed area by category, {}:", args.year);
    for (category, area_m2) in summary.iter() {
        println!("  {:<28} {:>14}", category.label(), format_area(area_m2));
    }
    println!("  {:<28} {:>14}", "total", format_area(summary.total_m2()));

    Ok(())
}
