//! The masked change raster.
//!
//! Combining the before/after dominant-class grids yields one change
//! category per cell. Cells whose transition is untracked are dropped at
//! construction time, so the cell set of a [`ChangeRaster`] *is* the mask:
//! every downstream request (source composites, area reduction, sampling)
//! carries the raster by reference and is restricted to exactly these cells.

use crate::backend::types::ClassGrid;
use crate::geometry::Bounds;
use crate::landclass::{self, ChangeCategory, LandClass};

/// One covered cell of the change raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeCell {
    pub longitude: f64,
    pub latitude: f64,
    pub category: ChangeCategory,
}

/// Per-cell change classification for one polygon and year.
///
/// Holds only covered cells; a raster with no cells is the legitimate
/// "no measurable change" result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRaster {
    scale_m: f64,
    cells: Vec<ChangeCell>,
    footprint: Bounds,
}

/// Raised when the backend returns before/after grids that cannot be
/// combined cell-wise.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridMismatch {
    #[error("before grid has {before} cells but after grid has {after}")]
    CellCount { before: usize, after: usize },

    #[error("cell {index} centers diverge between grids: {before:?} vs {after:?}")]
    CellCenter {
        index: usize,
        before: (f64, f64),
        after: (f64, f64),
    },
}

/// Two grid cells are considered co-located within this tolerance (degrees).
const CENTER_TOLERANCE_DEG: f64 = 1e-7;

impl ChangeRaster {
    /// Combines two dominant-class grids into a masked change raster.
    ///
    /// Cells are matched positionally; both grids must come from the same
    /// composite geometry, which is verified against the cell centers.
    /// Cells with no valid observations in either window, and cells whose
    /// transition is untracked, are masked out.
    ///
    /// # Errors
    ///
    /// Returns [`GridMismatch`] when the grids differ in length or cell
    /// centers, which indicates a backend contract violation.
    pub fn from_grids(before: &ClassGrid, after: &ClassGrid) -> Result<ChangeRaster, GridMismatch> {
        if before.cells.len() != after.cells.len() {
            return Err(GridMismatch::CellCount {
                before: before.cells.len(),
                after: after.cells.len(),
            });
        }

        let mut cells = Vec::new();
        let mut footprint = Bounds::EMPTY;

        for (index, (b, a)) in before.cells.iter().zip(after.cells.iter()).enumerate() {
            if (b.longitude - a.longitude).abs() > CENTER_TOLERANCE_DEG
                || (b.latitude - a.latitude).abs() > CENTER_TOLERANCE_DEG
            {
                return Err(GridMismatch::CellCenter {
                    index,
                    before: (b.longitude, b.latitude),
                    after: (a.longitude, a.latitude),
                });
            }

            let category = match (LandClass::from_index(b.value), LandClass::from_index(a.value)) {
                (Some(before_class), Some(after_class)) => {
                    landclass::remap(before_class, after_class)
                }
                // Unobserved in either window: nothing to classify.
                _ => ChangeCategory::Ignore,
            };

            if category.is_tracked() {
                footprint.min_lon = footprint.min_lon.min(b.longitude);
                footprint.min_lat = footprint.min_lat.min(b.latitude);
                footprint.max_lon = footprint.max_lon.max(b.longitude);
                footprint.max_lat = footprint.max_lat.max(b.latitude);
                cells.push(ChangeCell {
                    longitude: b.longitude,
                    latitude: b.latitude,
                    category,
                });
            }
        }

        Ok(ChangeRaster {
            scale_m: before.scale_m,
            cells,
            footprint,
        })
    }

    /// An empty raster at the given scale (no covered cells).
    pub fn empty(scale_m: f64) -> ChangeRaster {
        ChangeRaster {
            scale_m,
            cells: Vec::new(),
            footprint: Bounds::EMPTY,
        }
    }

    /// Analysis scale of the underlying grid, in meters per cell edge.
    pub fn scale_m(&self) -> f64 {
        self.scale_m
    }

    /// Covered cells, in grid order.
    pub fn cells(&self) -> &[ChangeCell] {
        &self.cells
    }

    /// Number of covered cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cell changed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounding box of the covered cells.
    pub fn footprint(&self) -> Bounds {
        self.footprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::ClassCell;
    use crate::landclass::NO_DATA_VALUE;

    fn grid(values: &[i16]) -> ClassGrid {
        ClassGrid {
            scale_m: 10.0,
            cells: values
                .iter()
                .enumerate()
                .map(|(index, &value)| ClassCell {
                    longitude: -124.0 + index as f64 * 1e-4,
                    latitude: 41.0,
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_tracked_transitions_survive_masking() {
        // trees->built, built->grass, water->water, grass->trees
        let before = grid(&[1, 6, 0, 2]);
        let after = grid(&[6, 2, 0, 1]);

        let raster = ChangeRaster::from_grids(&before, &after).unwrap();
        assert_eq!(raster.len(), 2);
        assert_eq!(raster.cells()[0].category, ChangeCategory::TreesGained);
        assert_eq!(raster.cells()[1].category, ChangeCategory::GrassLost);
        assert!(raster.cells().iter().all(|cell| cell.category.is_tracked()));
    }

    #[test]
    fn test_no_data_cells_are_masked() {
        let before = grid(&[NO_DATA_VALUE, 1]);
        let after = grid(&[6, NO_DATA_VALUE]);

        let raster = ChangeRaster::from_grids(&before, &after).unwrap();
        assert!(raster.is_empty());
        assert!(raster.footprint().is_empty());
    }

    #[test]
    fn test_all_unobserved_yields_empty_raster() {
        let before = grid(&[NO_DATA_VALUE, NO_DATA_VALUE]);
        let after = grid(&[NO_DATA_VALUE, NO_DATA_VALUE]);

        let raster = ChangeRaster::from_grids(&before, &after).unwrap();
        assert!(raster.is_empty());
        assert_eq!(raster.scale_m(), 10.0);
    }

    #[test]
    fn test_mismatched_grids_are_rejected() {
        let before = grid(&[1, 2]);
        let after = grid(&[6]);
        assert!(matches!(
            ChangeRaster::from_grids(&before, &after),
            Err(GridMismatch::CellCount { before: 2, after: 1 })
        ));

        let before = grid(&[1]);
        let mut after = grid(&[6]);
        after.cells[0].latitude += 0.5;
        assert!(matches!(
            ChangeRaster::from_grids(&before, &after),
            Err(GridMismatch::CellCenter { index: 0, .. })
        ));
    }
}
