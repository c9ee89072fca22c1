//! Pipeline orchestration.
//!
//! [`ChangeAnalysis`] is the entry point for one polygon + year run. It
//! classifies change once, then derives the two outputs from the same
//! masked raster: the per-category area summary and the joined inference
//! table. All intermediate state is threaded explicitly through a
//! [`RunContext`]; nothing is cached between runs.

use geo::Polygon;
use thiserror::Error;
use tracing::info;

use crate::area::{self, AreaSummary};
use crate::backend::{BackendError, GeoBackend, RetryPolicy, RetryingBackend};
use crate::change::{ChangeClassifier, ChangeRaster, ClassifyError};
use crate::context::RunContext;
use crate::export::{self, InferenceTable};
use crate::geometry::{self, GeometryError};
use crate::join;
use crate::sources;

/// Tunables for one analysis instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Fail-fast ceiling on polygon area, in square meters.
    pub area_ceiling_m2: f64,
    /// Analysis scale in meters per cell edge.
    pub scale_m: f64,
    /// Retry policy for transient backend failures.
    pub retry: RetryPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            area_ceiling_m2: crate::config::DEFAULT_AREA_CEILING_M2,
            scale_m: crate::backend::PIXEL_SCALE_M,
            retry: RetryPolicy::default(),
        }
    }
}

/// Errors from a pipeline run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AnalysisError {
    /// True when the caller can fix the input (as opposed to a backend
    /// failure worth reporting or retrying later).
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            AnalysisError::Geometry(_)
                | AnalysisError::Classify(ClassifyError::AreaExceedsLimit { .. })
        )
    }
}

/// Both outputs of one full run, derived from a single change raster.
#[derive(Debug, Clone)]
pub struct ChangeReport {
    pub area: AreaSummary,
    pub table: InferenceTable,
    /// Number of covered (changed) cells behind both outputs.
    pub covered_cells: usize,
}

/// One-polygon-one-year analysis pipeline.
///
/// ```no_run
/// use landshift::analysis::{AnalysisConfig, ChangeAnalysis};
/// use landshift::backend::{ReqwestClient, RestBackend};
///
/// let http = ReqwestClient::new()?;
/// let backend = RestBackend::new(http, "https://compute.example.com");
/// let analysis = ChangeAnalysis::new(backend, AnalysisConfig::default());
///
/// let ring = [
///     (-124.1451, 41.1181),
///     (-124.1451, 41.1146),
///     (-124.1394, 41.1146),
///     (-124.1394, 41.1181),
/// ];
/// let summary = analysis.area_of_change(&ring, 2018)?;
/// for (category, area_m2) in summary.iter() {
///     println!("{}: {:.0} m²", category, area_m2);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ChangeAnalysis<B: GeoBackend> {
    backend: RetryingBackend<B>,
    config: AnalysisConfig,
}

impl<B: GeoBackend> ChangeAnalysis<B> {
    pub fn new(backend: B, config: AnalysisConfig) -> Self {
        let retry = config.retry.clone();
        Self {
            backend: RetryingBackend::new(backend, retry),
            config,
        }
    }

    /// The wrapped backend, for inspection in tests.
    pub fn backend(&self) -> &B {
        self.backend.inner()
    }

    /// Per-category changed area for one polygon and year.
    pub fn area_of_change(
        &self,
        ring: &[(f64, f64)],
        year: i32,
    ) -> Result<AreaSummary, AnalysisError> {
        let polygon = geometry::polygon_from_ring(ring)?;
        let change = self.classify(&polygon, year)?;
        let ctx = self.context(&polygon, year, &change);
        Ok(area::summarize_area(&self.backend, &ctx)?)
    }

    /// The joined inference table for one polygon and year.
    pub fn inference_table(
        &self,
        ring: &[(f64, f64)],
        year: i32,
    ) -> Result<InferenceTable, AnalysisError> {
        let polygon = geometry::polygon_from_ring(ring)?;
        let change = self.classify(&polygon, year)?;
        let ctx = self.context(&polygon, year, &change);
        self.materialize(&ctx)
    }

    /// Both outputs from a single classification.
    pub fn analyze(&self, ring: &[(f64, f64)], year: i32) -> Result<ChangeReport, AnalysisError> {
        let polygon = geometry::polygon_from_ring(ring)?;
        let change = self.classify(&polygon, year)?;
        let ctx = self.context(&polygon, year, &change);

        let area = area::summarize_area(&self.backend, &ctx)?;
        let table = self.materialize(&ctx)?;

        Ok(ChangeReport {
            area,
            table,
            covered_cells: change.len(),
        })
    }

    fn classify(&self, polygon: &Polygon<f64>, year: i32) -> Result<ChangeRaster, ClassifyError> {
        info!(year, "Starting change analysis");
        ChangeClassifier::new(&self.backend, self.config.area_ceiling_m2, self.config.scale_m)
            .classify(polygon, year)
    }

    fn context<'a>(
        &self,
        polygon: &'a Polygon<f64>,
        year: i32,
        change: &'a ChangeRaster,
    ) -> RunContext<'a> {
        RunContext {
            polygon,
            year,
            change,
            scale_m: self.config.scale_m,
        }
    }

    fn materialize(&self, ctx: &RunContext<'_>) -> Result<InferenceTable, AnalysisError> {
        // Climate must land before the joins; the other fetches are
        // independent of each other.
        let climate = sources::fetch_climate(&self.backend, ctx)?;
        let leaf = sources::fetch_leaf_index(&self.backend, ctx)?;
        let land_probability = sources::fetch_land_probability(&self.backend, ctx)?;
        let elevation = sources::fetch_elevation(&self.backend, ctx)?;

        let joined = match elevation {
            Some(elevation) => join::join_sources(climate, &leaf, &land_probability, &elevation),
            // No covered cells: nothing was fetched.
            None => Vec::new(),
        };

        Ok(export::materialize(&self.backend, ctx, &joined)?)
    }
}
