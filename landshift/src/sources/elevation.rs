//! Elevation source: one static masked layer.

use crate::backend::{BackendError, GeoBackend, MaskedCompositeRequest, RasterRef, Reducer};
use crate::context::RunContext;

/// Elevation dataset identifier.
pub const ELEVATION_DATASET: &str = "USGS/3DEP/10m";

/// The single elevation attribute.
pub const ELEVATION_ATTRIBUTE: &str = "elevation";

/// Fetches the static elevation layer masked to the covered change cells.
///
/// Elevation has no time dimension; the one raster is attached to every
/// joined snapshot. An empty change raster yields `None` without a backend
/// call.
pub fn fetch_elevation<B: GeoBackend>(
    backend: &B,
    ctx: &RunContext<'_>,
) -> Result<Option<RasterRef>, BackendError> {
    if ctx.change.is_empty() {
        return Ok(None);
    }

    let raster = backend.masked_composite(&MaskedCompositeRequest {
        dataset: ELEVATION_DATASET,
        attributes: &[ELEVATION_ATTRIBUTE],
        window: None,
        reducer: Reducer::Mean,
        fill: None,
        mode_attribute: None,
        constant: None,
        change: ctx.change,
        polygon: ctx.polygon,
        scale_m: ctx.scale_m,
    })?;

    Ok(Some(raster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::tests::{seeded_context, ContextParts};

    #[test]
    fn test_single_static_layer() {
        let ContextParts { backend, polygon, change } = seeded_context();
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &change,
            scale_m: 100.0,
        };

        let raster = fetch_elevation(&backend, &ctx).unwrap().unwrap();
        assert_eq!(raster.attributes, vec![ELEVATION_ATTRIBUTE.to_string()]);
        assert_eq!(backend.calls(), 1);

        let log = backend.composite_log();
        assert_eq!(log.len(), 1);
        assert!(log[0].window.is_none());
    }

    #[test]
    fn test_empty_change_raster_short_circuits() {
        let ContextParts { backend, polygon, .. } = seeded_context();
        let empty = crate::change::ChangeRaster::empty(100.0);
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &empty,
            scale_m: 100.0,
        };

        assert!(fetch_elevation(&backend, &ctx).unwrap().is_none());
        assert_eq!(backend.calls(), 0);
    }
}
