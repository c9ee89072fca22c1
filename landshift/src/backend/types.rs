//! Backend request/response types and errors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use geo::Polygon;
use thiserror::Error;

use crate::calendar::DateRange;
use crate::change::ChangeRaster;
use crate::geometry::Bounds;

/// Analysis scale of the land-cover grid, in meters per cell edge.
pub const PIXEL_SCALE_M: f64 = 10.0;

/// Projection used for grouped area reductions.
pub const AREA_PROJECTION: &str = "EPSG:32610";

/// Projection used when sampling per-pixel rows.
pub const SAMPLE_PROJECTION: &str = "EPSG:4326";

/// Errors that can occur while talking to the remote compute backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Network-level failure (connection refused, DNS, read error).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the client timeout.
    #[error("backend request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status from the backend.
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend rejected the request for exceeding a processing quota.
    #[error("backend processing quota exceeded: {0}")]
    Quota(String),

    /// The response body could not be interpreted.
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// The backend answered with data that violates the service contract.
    #[error("backend contract violation: {0}")]
    Contract(String),
}

impl BackendError {
    /// True when retrying the same request may succeed.
    ///
    /// Transport failures, timeouts, quota rejections, and server-side HTTP
    /// statuses are transient; malformed or contract-violating responses and
    /// client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Transport(_) | BackendError::Timeout(_) | BackendError::Quota(_) => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            BackendError::Malformed(_) | BackendError::Contract(_) => false,
        }
    }
}

/// Reduction applied across all observations of a composite window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Mode,
}

impl Reducer {
    pub fn as_str(self) -> &'static str {
        match self {
            Reducer::Mean => "mean",
            Reducer::Mode => "mode",
        }
    }
}

/// One cell of a dominant-class grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassCell {
    pub longitude: f64,
    pub latitude: f64,
    /// Class index 0–8, or the no-data sentinel for unobserved cells.
    pub value: i16,
}

/// A materialized dominant-class grid for one time window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassGrid {
    pub scale_m: f64,
    pub cells: Vec<ClassCell>,
}

/// Opaque reference to a composited raster held by the backend.
///
/// The raster data itself stays remote; locally we only track its identity,
/// the attribute (band) names it carries, and its footprint for join tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRef {
    pub id: String,
    pub attributes: Vec<String>,
    pub footprint: Bounds,
}

/// Requests the per-cell dominant land class over a time window.
///
/// The backend averages the class-probability vectors of every observation
/// intersecting the polygon in the window and takes the arg-max per cell;
/// cells with no observations carry the no-data sentinel.
#[derive(Debug, Clone, Copy)]
pub struct ClassCompositeRequest<'a> {
    pub dataset: &'a str,
    pub window: DateRange,
    pub polygon: &'a Polygon<f64>,
    pub scale_m: f64,
}

/// Requests a composited raster masked to the covered change cells.
#[derive(Debug, Clone, Copy)]
pub struct MaskedCompositeRequest<'a> {
    pub dataset: &'a str,
    /// Attribute names of the composited output, in order.
    pub attributes: &'a [&'a str],
    /// Compositing window; `None` for static datasets.
    pub window: Option<DateRange>,
    pub reducer: Reducer,
    /// Value substituted for missing observations instead of null.
    pub fill: Option<f64>,
    /// Extra attribute reduced by mode, surfaced as `<name>_mode`.
    pub mode_attribute: Option<&'a str>,
    /// Extra constant-valued attribute attached to every cell.
    pub constant: Option<(&'a str, f64)>,
    pub change: &'a ChangeRaster,
    pub polygon: &'a Polygon<f64>,
    pub scale_m: f64,
}

/// Requests a grouped scalar reduction over the covered change cells.
#[derive(Debug, Clone, Copy)]
pub struct ReduceRegionRequest<'a> {
    pub change: &'a ChangeRaster,
    pub polygon: &'a Polygon<f64>,
    /// Grouping attribute; each covered cell contributes to its group's sum.
    pub grouping: &'a str,
    pub scale_m: f64,
    pub projection: &'a str,
}

/// One group of a grouped reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSum {
    pub group: i32,
    pub sum: f64,
}

/// One time-tagged raster bundle to sample rows from.
#[derive(Debug, Clone)]
pub struct SampleFrame<'a> {
    /// Representative timestamp stamped onto every row of the frame.
    pub timestamp: NaiveDate,
    /// Rasters whose attributes are merged into each row.
    pub rasters: Vec<&'a RasterRef>,
}

/// Requests one fixed-size page of per-pixel rows.
///
/// Rows are ordered frame-major (all cells of the first frame, then the
/// second, …); `offset` addresses into that total order.
#[derive(Debug, Clone)]
pub struct SamplePageRequest<'a> {
    pub frames: &'a [SampleFrame<'a>],
    pub change: &'a ChangeRaster,
    pub polygon: &'a Polygon<f64>,
    pub scale_m: f64,
    pub projection: &'a str,
    pub page_size: usize,
    pub offset: usize,
}

/// One raw sample row as returned by the backend.
///
/// Keys are attribute names; values are JSON scalars. Typing and null
/// handling happen at the materialization boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleRow {
    pub values: BTreeMap<String, serde_json::Value>,
}

/// One page of sample rows.
///
/// `exhausted` is the explicit end-of-data signal: when set, no further page
/// requests are needed. An empty `rows` with `exhausted == false` is also
/// treated as end of data by callers, but a backend should always set the
/// flag on its final page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SamplePage {
    pub rows: Vec<SampleRow>,
    pub exhausted: bool,
}
