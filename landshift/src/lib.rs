//! Landshift - land-cover change detection and carbon-signal joins
//!
//! This library estimates, for an arbitrary polygon and year, how much land
//! cover changed between vegetation and built-up land, and joins the
//! changed cells against climate, leaf-index, elevation, and land-class
//! probability series so a downstream model can estimate carbon absorption.
//!
//! All heavy raster computation runs on a remote compute service behind the
//! [`backend::GeoBackend`] trait; the pipeline itself is a bounded sequence
//! of blocking request/response calls orchestrated by
//! [`analysis::ChangeAnalysis`].

pub mod analysis;
pub mod area;
pub mod backend;
pub mod calendar;
pub mod change;
pub mod config;
pub mod context;
pub mod export;
pub mod geometry;
pub mod join;
pub mod landclass;
pub mod logging;
pub mod model;
pub mod sources;

pub use analysis::{AnalysisConfig, AnalysisError, ChangeAnalysis, ChangeReport};
pub use area::AreaSummary;
pub use change::ChangeRaster;
pub use export::InferenceTable;
pub use landclass::{ChangeCategory, LandClass};
