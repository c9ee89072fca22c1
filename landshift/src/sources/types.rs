//! Shared source-series types.

use chrono::NaiveDate;

use crate::backend::RasterRef;
use crate::geometry::Bounds;

/// One time-tagged masked raster produced by a source fetcher.
///
/// The raster data stays on the backend; locally a snapshot is the unit the
/// temporal join matches on — its timestamp and footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Representative timestamp (bin or quarter start).
    pub timestamp: NaiveDate,
    pub raster: RasterRef,
}

impl Snapshot {
    /// Footprint of the underlying raster.
    pub fn footprint(&self) -> Bounds {
        self.raster.footprint
    }
}
