//! Remote geospatial compute abstraction.
//!
//! All heavy raster computation (compositing, masking, grouped reduction,
//! per-pixel sampling) runs on a remote backend; the pipeline only issues a
//! bounded sequence of blocking request/response calls. The [`GeoBackend`]
//! trait captures that contract so the orchestration layer can run against
//! the HTTP service in production and against the deterministic in-memory
//! implementation in tests and offline runs.
//!
//! # Implementations
//!
//! - [`RestBackend`]: HTTP/JSON client over an injectable [`HttpClient`]
//! - [`MemoryBackend`]: deterministic in-process compute for tests
//! - [`RetryingBackend`]: decorator retrying transient failures with backoff

mod memory;
mod rest;
mod retry;
pub mod types;

pub use memory::{CompositeLogEntry, MemoryBackend};
pub use rest::{HttpClient, ReqwestClient, RestBackend};
pub use retry::{RetryPolicy, RetryingBackend};
pub use types::{
    BackendError, ClassCell, ClassCompositeRequest, ClassGrid, GroupSum, MaskedCompositeRequest,
    RasterRef, ReduceRegionRequest, Reducer, SampleFrame, SamplePage, SamplePageRequest, SampleRow,
    AREA_PROJECTION, PIXEL_SCALE_M, SAMPLE_PROJECTION,
};

use geo::Polygon;

/// The remote compute service contract.
///
/// Implementations must be `Send + Sync`; a single pipeline run issues calls
/// strictly sequentially, but independent runs may share one backend.
pub trait GeoBackend: Send + Sync {
    /// Per-cell dominant land class over all observations in a window.
    fn class_composite(
        &self,
        request: &ClassCompositeRequest<'_>,
    ) -> Result<ClassGrid, BackendError>;

    /// Composites a dataset over an optional window, masked to the covered
    /// change cells, returning a reference to the remote raster.
    fn masked_composite(
        &self,
        request: &MaskedCompositeRequest<'_>,
    ) -> Result<RasterRef, BackendError>;

    /// Grouped per-cell area sums over the covered change cells.
    fn reduce_region(&self, request: &ReduceRegionRequest<'_>)
        -> Result<Vec<GroupSum>, BackendError>;

    /// One fixed-size page of per-pixel sample rows.
    fn sample_page(&self, request: &SamplePageRequest<'_>) -> Result<SamplePage, BackendError>;

    /// Scalar area of a polygon in square meters.
    fn polygon_area(&self, polygon: &Polygon<f64>) -> Result<f64, BackendError>;
}
