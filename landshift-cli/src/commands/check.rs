//! `landshift check` - validate a polygon against the area ceiling.

use std::path::PathBuf;

use clap::Args;

use landshift::geometry;

use super::{format_area, load_config, read_ring};
use crate::error::CliError;

/// Arguments for the `check` command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// JSON file with the polygon ring as [[lon, lat], ...]
    #[arg(long)]
    pub polygon: PathBuf,
}

/// Run the `check` command.
///
/// Validates the ring and reports the polygon's area against the configured
/// processing ceiling, without touching the backend.
pub fn run(args: CheckArgs, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let ring = read_ring(&args.polygon)?;

    let polygon =
        geometry::polygon_from_ring(&ring).map_err(|e| CliError::Input(e.to_string()))?;
    let area_m2 = geometry::geodesic_area_m2(&polygon);
    let ceiling = config.analysis.area_ceiling_m2;

    println!("Polygon area:   {}", format_area(area_m2));
    println!("Area ceiling:   {}", format_area(ceiling));

    if area_m2 > ceiling {
        return Err(CliError::Input(format!(
            "polygon area {} exceeds the processing ceiling {}",
            format_area(area_m2),
            format_area(ceiling)
        )));
    }

    println!("OK: polygon is within the processing ceiling.");
    Ok(())
}
