//! Polygon construction and area helpers.
//!
//! Callers supply an analysis region as an ordered ring of
//! (longitude, latitude) pairs. This module validates the ring, builds the
//! `geo` polygon used throughout the pipeline, and provides the geodesic
//! area computations behind the pre-flight area guard and the per-cell area
//! synthesis of the in-memory backend.

use geo::{BoundingRect, GeodesicArea, LineString, Polygon};
use thiserror::Error;

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Errors raised while validating caller-supplied geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The ring has fewer than three distinct vertices.
    #[error("polygon ring needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    /// A coordinate is NaN or infinite.
    #[error("polygon ring contains a non-finite coordinate at position {0}")]
    NonFiniteCoordinate(usize),

    /// A coordinate is outside the valid longitude/latitude range.
    #[error("coordinate ({longitude}, {latitude}) is outside the valid range")]
    OutOfRange { longitude: f64, latitude: f64 },
}

/// Builds a validated polygon from an ordered (longitude, latitude) ring.
///
/// The ring does not need to repeat its first vertex; closure is handled by
/// the polygon constructor.
///
/// # Errors
///
/// Returns [`GeometryError`] if the ring is degenerate, contains non-finite
/// values, or falls outside the valid coordinate range.
pub fn polygon_from_ring(ring: &[(f64, f64)]) -> Result<Polygon<f64>, GeometryError> {
    for (position, &(longitude, latitude)) in ring.iter().enumerate() {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate(position));
        }
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeometryError::OutOfRange { longitude, latitude });
        }
    }

    let mut distinct: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for &pair in ring {
        if distinct.last() != Some(&pair) {
            distinct.push(pair);
        }
    }
    // An explicitly closed ring repeats its first vertex; drop the repeat
    // before counting.
    if distinct.len() > 1 && distinct.first() == distinct.last() {
        distinct.pop();
    }
    if distinct.len() < 3 {
        return Err(GeometryError::TooFewVertices(distinct.len()));
    }

    Ok(Polygon::new(LineString::from(distinct), vec![]))
}

/// Geodesic (ellipsoidal) area of a polygon in square meters.
pub fn geodesic_area_m2(polygon: &Polygon<f64>) -> f64 {
    polygon.geodesic_area_unsigned()
}

/// Geodesic area of one square analysis cell centered at the given latitude.
///
/// The cell is modeled as a `scale_m` × `scale_m` square on the ellipsoid,
/// so the result shrinks with the cosine of the latitude exactly as the
/// underlying grid cells do.
pub fn cell_area_m2(longitude: f64, latitude: f64, scale_m: f64) -> f64 {
    cell_polygon(longitude, latitude, scale_m).geodesic_area_unsigned()
}

/// The square footprint of one analysis cell, in degrees.
pub fn cell_polygon(longitude: f64, latitude: f64, scale_m: f64) -> Polygon<f64> {
    let half_lat = scale_m / METERS_PER_DEGREE_LAT / 2.0;
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * latitude.to_radians().cos().max(1e-9);
    let half_lon = scale_m / meters_per_degree_lon / 2.0;

    Polygon::new(
        LineString::from(vec![
            (longitude - half_lon, latitude - half_lat),
            (longitude + half_lon, latitude - half_lat),
            (longitude + half_lon, latitude + half_lat),
            (longitude - half_lon, latitude + half_lat),
        ]),
        vec![],
    )
}

/// An axis-aligned longitude/latitude bounding box.
///
/// Wire-friendly footprint representation attached to raster references;
/// used by the temporal join to test footprint intersection without pulling
/// cell data back from the backend.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// An empty bounds value that intersects nothing.
    pub const EMPTY: Bounds = Bounds {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    /// Bounding box of a polygon's exterior ring.
    pub fn from_polygon(polygon: &Polygon<f64>) -> Bounds {
        match polygon.bounding_rect() {
            Some(rect) => Bounds {
                min_lon: rect.min().x,
                min_lat: rect.min().y,
                max_lon: rect.max().x,
                max_lat: rect.max().y,
            },
            None => Bounds::EMPTY,
        }
    }

    /// True when the two boxes share any point.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    /// True for the degenerate empty box.
    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }
}
