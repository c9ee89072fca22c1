//! Changed-area aggregation.
//!
//! Groups the covered change cells by category and sums each cell's
//! geodesic area. The heavy per-cell work runs on the backend as a grouped
//! region reduction over the same masked raster every other stage uses, so
//! the totals stay consistent with the joined rows' cell population.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::backend::{BackendError, GeoBackend, GroupSum, ReduceRegionRequest, AREA_PROJECTION};
use crate::context::RunContext;
use crate::landclass::ChangeCategory;

/// Grouping attribute for the area reduction.
const GROUPING_ATTRIBUTE: &str = "change";

/// Summed changed area per category, in square meters.
///
/// Never contains the ignore category; an empty summary is the legitimate
/// "no measurable change" result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaSummary {
    sums: BTreeMap<ChangeCategory, f64>,
}

impl AreaSummary {
    /// Builds a summary from backend reduction groups.
    ///
    /// Unknown group codes and the ignore group are dropped with a warning;
    /// neither should appear for a well-behaved backend.
    pub fn from_groups(groups: Vec<GroupSum>) -> AreaSummary {
        let mut sums = BTreeMap::new();
        for group in groups {
            match u8::try_from(group.group).ok().and_then(ChangeCategory::from_code) {
                Some(category) if category.is_tracked() => {
                    sums.insert(category, group.sum);
                }
                Some(_) | None => {
                    warn!(group = group.group, sum = group.sum, "Dropping unexpected area group");
                }
            }
        }
        AreaSummary { sums }
    }

    /// Summed area for one category, if any cell changed that way.
    pub fn get(&self, category: ChangeCategory) -> Option<f64> {
        self.sums.get(&category).copied()
    }

    /// Categories and sums in ascending category order.
    pub fn iter(&self) -> impl Iterator<Item = (ChangeCategory, f64)> + '_ {
        self.sums.iter().map(|(&category, &sum)| (category, sum))
    }

    /// Total changed area across all categories.
    pub fn total_m2(&self) -> f64 {
        self.sums.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }
}

/// Reduces the change raster to per-category area sums.
///
/// An empty change raster returns an empty summary without a backend call.
pub fn summarize_area<B: GeoBackend>(
    backend: &B,
    ctx: &RunContext<'_>,
) -> Result<AreaSummary, BackendError> {
    if ctx.change.is_empty() {
        info!(year = ctx.year, "No changed cells; empty area summary");
        return Ok(AreaSummary::default());
    }

    let groups = backend.reduce_region(&ReduceRegionRequest {
        change: ctx.change,
        polygon: ctx.polygon,
        grouping: GROUPING_ATTRIBUTE,
        scale_m: ctx.scale_m,
        projection: AREA_PROJECTION,
    })?;

    let summary = AreaSummary::from_groups(groups);
    info!(
        year = ctx.year,
        categories = summary.len(),
        total_m2 = summary.total_m2() as u64,
        "Area aggregation complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::tests::{seeded_context, ContextParts};

    #[test]
    fn test_never_contains_the_ignore_category() {
        let summary = AreaSummary::from_groups(vec![
            GroupSum { group: 0, sum: 100.0 },
            GroupSum { group: 1, sum: 250.0 },
            GroupSum { group: 7, sum: 50.0 },
            GroupSum { group: 42, sum: 5.0 },
        ]);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.get(ChangeCategory::TreesGained), Some(250.0));
        assert_eq!(summary.get(ChangeCategory::GrassLost), Some(50.0));
        assert_eq!(summary.get(ChangeCategory::Ignore), None);
        assert_eq!(summary.total_m2(), 300.0);
    }

    #[test]
    fn test_summary_from_seeded_backend() {
        let ContextParts { backend, polygon, change } = seeded_context();
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &change,
            scale_m: 100.0,
        };

        let summary = summarize_area(&backend, &ctx).unwrap();
        assert!(!summary.is_empty());
        assert!(summary.iter().all(|(category, sum)| category.is_tracked() && sum > 0.0));

        // Changed area cannot exceed the polygon's own area.
        let polygon_area = crate::geometry::geodesic_area_m2(&polygon);
        assert!(summary.total_m2() <= polygon_area);
    }

    #[test]
    fn test_empty_change_raster_is_not_an_error() {
        let ContextParts { backend, polygon, .. } = seeded_context();
        let empty = crate::change::ChangeRaster::empty(100.0);
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &empty,
            scale_m: 100.0,
        };

        let summary = summarize_area(&backend, &ctx).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.total_m2(), 0.0);
        assert_eq!(backend.calls(), 0);
    }
}
