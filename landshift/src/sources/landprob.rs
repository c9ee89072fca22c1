//! Quarterly land-class probability source.

use tracing::debug;

use super::types::Snapshot;
use super::LAND_COVER_DATASET;
use crate::backend::{BackendError, GeoBackend, MaskedCompositeRequest, Reducer};
use crate::calendar::Quarter;
use crate::context::RunContext;

/// Mean class-probability attributes, one per land class.
pub const CLASS_MEAN_ATTRIBUTES: [&str; 9] = [
    "water_mean",
    "trees_mean",
    "grass_mean",
    "flooded_vegetation_mean",
    "crops_mean",
    "shrub_and_scrub_mean",
    "built_mean",
    "bare_mean",
    "snow_and_ice_mean",
];

/// Attribute reduced by mode into the quarter's dominant class label.
pub const LABEL_ATTRIBUTE: &str = "label";

/// Constant attribute carrying the 1-based quarter index.
pub const QUARTER_ATTRIBUTE: &str = "quarter";

/// Fetches one land-probability composite per calendar quarter.
///
/// Each quarter contributes the mean class-probability vector plus the
/// quarter's dominant (mode) class and its index, so the inference table
/// can distinguish which season a climate sample was joined against. The
/// snapshot timestamp is the quarter start.
pub fn fetch_land_probability<B: GeoBackend>(
    backend: &B,
    ctx: &RunContext<'_>,
) -> Result<Vec<Snapshot>, BackendError> {
    if ctx.change.is_empty() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::with_capacity(Quarter::ALL.len());
    for quarter in Quarter::ALL {
        let window = quarter.date_range(ctx.year);
        debug!(quarter = %quarter, %window, "Fetching land-probability composite");

        let raster = backend.masked_composite(&MaskedCompositeRequest {
            dataset: LAND_COVER_DATASET,
            attributes: &CLASS_MEAN_ATTRIBUTES,
            window: Some(window),
            reducer: Reducer::Mean,
            fill: None,
            mode_attribute: Some(LABEL_ATTRIBUTE),
            constant: Some((QUARTER_ATTRIBUTE, quarter.index() as f64)),
            change: ctx.change,
            polygon: ctx.polygon,
            scale_m: ctx.scale_m,
        })?;
        snapshots.push(Snapshot {
            timestamp: window.start,
            raster,
        });
    }

    Ok(snapshots)
}
