//! Leaf-index source: 8-day leaf-area and radiation-absorption composites.

use chrono::NaiveDate;
use tracing::debug;

use super::types::Snapshot;
use crate::backend::{BackendError, GeoBackend, MaskedCompositeRequest, Reducer};
use crate::calendar;
use crate::context::RunContext;

/// Leaf-area-index dataset identifier.
pub const LEAF_DATASET: &str = "MODIS/061/MOD15A2H";

/// Leaf area index and fraction of absorbed photosynthetically active
/// radiation.
pub const LEAF_ATTRIBUTES: [&str; 2] = ["lai", "fpar"];

/// Substitute for missing leaf observations.
///
/// Dense built-up cells frequently have no valid retrieval; a small
/// constant keeps those cells joinable instead of propagating nulls.
pub const LEAF_FILL_VALUE: f64 = 0.01;

/// Fetches 8-day mean leaf-index composites over the observation span.
///
/// Bins follow the dataset's native compositing cadence, which restarts at
/// January 1; anchoring at January 1 of the prior year covers the December
/// head of the span. The bin offsets therefore drift against the climate
/// series, which is what the temporal join's tolerance absorbs.
pub fn fetch_leaf_index<B: GeoBackend>(
    backend: &B,
    ctx: &RunContext<'_>,
) -> Result<Vec<Snapshot>, BackendError> {
    if ctx.change.is_empty() {
        return Ok(Vec::new());
    }

    let span = calendar::observation_span(ctx.year);
    let anchor = NaiveDate::from_ymd_opt(ctx.year - 1, 1, 1).expect("valid calendar date");
    let bins = calendar::eight_day_bins(span, anchor);
    debug!(bins = bins.len(), %span, "Fetching leaf-index composites");

    let mut snapshots = Vec::with_capacity(bins.len());
    for bin in bins {
        let raster = backend.masked_composite(&MaskedCompositeRequest {
            dataset: LEAF_DATASET,
            attributes: &LEAF_ATTRIBUTES,
            window: Some(bin),
            reducer: Reducer::Mean,
            fill: Some(LEAF_FILL_VALUE),
            mode_attribute: None,
            constant: None,
            change: ctx.change,
            polygon: ctx.polygon,
            scale_m: ctx.scale_m,
        })?;
        snapshots.push(Snapshot {
            timestamp: bin.start,
            raster,
        });
    }

    Ok(snapshots)
}
