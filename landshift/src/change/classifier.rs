//! Builds the change raster from two dominant-class composites.

use geo::Polygon;
use thiserror::Error;
use tracing::{debug, info};

use super::raster::{ChangeRaster, GridMismatch};
use crate::backend::{BackendError, ClassCompositeRequest, GeoBackend};
use crate::calendar;
use crate::geometry;
use crate::sources::LAND_COVER_DATASET;

/// Errors from change classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// The polygon is larger than the configured processing ceiling.
    ///
    /// Raised before any backend request is issued; the caller should ask
    /// for a smaller region rather than retry.
    #[error(
        "polygon area {area_m2:.0} m² exceeds the processing ceiling of {limit_m2:.0} m²; \
         choose a smaller region"
    )]
    AreaExceedsLimit { area_m2: f64, limit_m2: f64 },

    /// The backend failed after any retries were exhausted.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend returned before/after grids that cannot be combined.
    #[error(transparent)]
    GridMismatch(#[from] GridMismatch),
}

/// Classifies per-cell land-cover change for a polygon and year.
///
/// The classification compares the quarter before the analysis year against
/// the first weeks after it: a cell whose dominant class moves between a
/// vegetation class and built-up land across that gap is a changed cell.
pub struct ChangeClassifier<'a, B: GeoBackend> {
    backend: &'a B,
    area_ceiling_m2: f64,
    scale_m: f64,
}

impl<'a, B: GeoBackend> ChangeClassifier<'a, B> {
    pub fn new(backend: &'a B, area_ceiling_m2: f64, scale_m: f64) -> Self {
        Self {
            backend,
            area_ceiling_m2,
            scale_m,
        }
    }

    /// Builds the masked change raster for one polygon and year.
    ///
    /// A polygon with zero valid observations in either window yields an
    /// empty raster, which downstream stages treat as "no measurable
    /// change" rather than a failure.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::AreaExceedsLimit`] before any backend call when the
    /// polygon is over the ceiling; backend and grid errors otherwise.
    pub fn classify(&self, polygon: &Polygon<f64>, year: i32) -> Result<ChangeRaster, ClassifyError> {
        // Guard against oversized jobs before any remote work is issued.
        let area_m2 = geometry::geodesic_area_m2(polygon);
        if area_m2 > self.area_ceiling_m2 {
            return Err(ClassifyError::AreaExceedsLimit {
                area_m2,
                limit_m2: self.area_ceiling_m2,
            });
        }

        let before_window = calendar::before_window(year);
        let after_window = calendar::after_window(year);
        debug!(%before_window, %after_window, "Requesting dominant-class composites");

        let before = self.backend.class_composite(&ClassCompositeRequest {
            dataset: LAND_COVER_DATASET,
            window: before_window,
            polygon,
            scale_m: self.scale_m,
        })?;
        let after = self.backend.class_composite(&ClassCompositeRequest {
            dataset: LAND_COVER_DATASET,
            window: after_window,
            polygon,
            scale_m: self.scale_m,
        })?;

        let raster = ChangeRaster::from_grids(&before, &after)?;
        info!(
            year,
            covered_cells = raster.len(),
            area_m2 = area_m2 as u64,
            "Change classification complete"
        );

        Ok(raster)
    }
}
