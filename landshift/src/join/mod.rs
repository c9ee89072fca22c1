//! Temporal join engine.
//!
//! The four source series run on different native cadences, so the join
//! matches snapshots by a bounded timestamp tolerance rather than exact
//! calendar equality. Two sequential left-outer joins are applied:
//!
//! 1. climate → leaf index, within [`LEAF_TOLERANCE_DAYS`]
//! 2. (climate + leaf) → quarterly land probability, within
//!    [`LAND_PROBABILITY_TOLERANCE_DAYS`]
//!
//! The wide second tolerance deliberately fans several climate snapshots
//! out onto the same quarterly composite, since the quarterly source
//! changes far less often. Unmatched rows are kept with the absent side
//! left empty; the static elevation layer is attached to every result.
//! When several candidates qualify, the earliest by timestamp wins.

use tracing::debug;

use crate::backend::RasterRef;
use crate::sources::Snapshot;

/// Maximum timestamp distance for the climate→leaf join, in days.
pub const LEAF_TOLERANCE_DAYS: i64 = 5;

/// Maximum timestamp distance for the climate→land-probability join, in
/// days. Wide enough that every 8-day climate bin reaches the nearest
/// quarter boundary.
pub const LAND_PROBABILITY_TOLERANCE_DAYS: i64 = 62;

/// One climate snapshot with everything joined against it.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedSnapshot {
    pub climate: Snapshot,
    pub leaf: Option<Snapshot>,
    pub land_probability: Option<Snapshot>,
    pub elevation: RasterRef,
}

impl JoinedSnapshot {
    /// Representative timestamp of the joined result.
    pub fn timestamp(&self) -> chrono::NaiveDate {
        self.climate.timestamp
    }
}

/// Earliest candidate within tolerance whose footprint intersects.
fn match_snapshot<'a>(
    left: &Snapshot,
    candidates: &'a [Snapshot],
    tolerance_days: i64,
) -> Option<&'a Snapshot> {
    candidates
        .iter()
        .filter(|candidate| {
            let distance = (candidate.timestamp - left.timestamp).num_days().abs();
            distance <= tolerance_days && candidate.footprint().intersects(&left.footprint())
        })
        .min_by_key(|candidate| candidate.timestamp)
}

/// Joins the four source series into one row-set seed per climate snapshot.
///
/// Left-outer on the climate series: every climate snapshot appears exactly
/// once in the result, with unmatched joins left as `None`.
pub fn join_sources(
    climate: Vec<Snapshot>,
    leaf: &[Snapshot],
    land_probability: &[Snapshot],
    elevation: &RasterRef,
) -> Vec<JoinedSnapshot> {
    let joined: Vec<JoinedSnapshot> = climate
        .into_iter()
        .map(|climate_snapshot| {
            let leaf_match = match_snapshot(&climate_snapshot, leaf, LEAF_TOLERANCE_DAYS).cloned();
            let land_match = match_snapshot(
                &climate_snapshot,
                land_probability,
                LAND_PROBABILITY_TOLERANCE_DAYS,
            )
            .cloned();

            JoinedSnapshot {
                climate: climate_snapshot,
                leaf: leaf_match,
                land_probability: land_match,
                elevation: elevation.clone(),
            }
        })
        .collect();

    let with_leaf = joined.iter().filter(|j| j.leaf.is_some()).count();
    let with_land = joined.iter().filter(|j| j.land_probability.is_some()).count();
    debug!(
        total = joined.len(),
        with_leaf, with_land, "Temporal join complete"
    );

    joined
}
