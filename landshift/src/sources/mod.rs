//! Source fetchers for the spatiotemporal join.
//!
//! Four independent adapters retrieve masked, time-tagged raster series for
//! the changed cells of one run: 8-day climate composites, 8-day leaf-index
//! composites, a static elevation layer, and quarterly land-class
//! probability composites. Every request carries the run's change raster,
//! so all four streams are aligned to the same masked cell population.

mod climate;
mod elevation;
mod landprob;
mod leaf;
mod types;

pub use climate::{fetch_climate, CLIMATE_ATTRIBUTES, CLIMATE_DATASET};
pub use elevation::{fetch_elevation, ELEVATION_ATTRIBUTE, ELEVATION_DATASET};
pub use landprob::{fetch_land_probability, CLASS_MEAN_ATTRIBUTES, LABEL_ATTRIBUTE, QUARTER_ATTRIBUTE};
pub use leaf::{fetch_leaf_index, LEAF_ATTRIBUTES, LEAF_DATASET, LEAF_FILL_VALUE};
pub use types::Snapshot;

/// Land-cover dataset used by the classifier and the quarterly fetcher.
pub const LAND_COVER_DATASET: &str = "GOOGLE/DYNAMICWORLD/V1";
