//! Climate source: 8-day meteorological composites.

use tracing::debug;

use super::types::Snapshot;
use crate::backend::{BackendError, GeoBackend, MaskedCompositeRequest, Reducer};
use crate::calendar;
use crate::context::RunContext;

/// Meteorological dataset identifier.
pub const CLIMATE_DATASET: &str = "IDAHO_EPSCOR/GRIDMET";

/// Minimum/maximum temperature, vapor-pressure deficit, and shortwave
/// radiation.
pub const CLIMATE_ATTRIBUTES: [&str; 4] = ["tmmn", "tmmx", "vpd", "srad"];

/// Fetches 8-day mean climate composites over the observation span.
///
/// Bins are anchored at the span start (December of the year before the
/// analysis year). Returns one snapshot per bin, masked to the covered
/// change cells; an empty change raster short-circuits to an empty series
/// without touching the backend.
pub fn fetch_climate<B: GeoBackend>(
    backend: &B,
    ctx: &RunContext<'_>,
) -> Result<Vec<Snapshot>, BackendError> {
    if ctx.change.is_empty() {
        return Ok(Vec::new());
    }

    let span = calendar::observation_span(ctx.year);
    let bins = calendar::eight_day_bins(span, span.start);
    debug!(bins = bins.len(), %span, "Fetching climate composites");

    let mut snapshots = Vec::with_capacity(bins.len());
    for bin in bins {
        let raster = backend.masked_composite(&MaskedCompositeRequest {
            dataset: CLIMATE_DATASET,
            attributes: &CLIMATE_ATTRIBUTES,
            window: Some(bin),
            reducer: Reducer::Mean,
            fill: None,
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
