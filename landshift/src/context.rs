//! Immutable per-run context.

use geo::Polygon;

use crate::change::ChangeRaster;

/// The facts shared by every stage of one pipeline run.
///
/// Built once after classification and passed by reference, so each
/// component sees exactly the same polygon, year, and masked change raster
/// without relying on hidden call-order-dependent state.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub polygon: &'a Polygon<f64>,
    pub year: i32,
    pub change: &'a ChangeRaster,
    /// Analysis scale in meters per cell edge.
    pub scale_m: f64,
}
