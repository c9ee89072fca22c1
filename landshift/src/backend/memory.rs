//! Deterministic in-process compute backend.
//!
//! Implements the full [`GeoBackend`] contract without a network: class
//! grids are seeded per window, composited rasters synthesize per-cell
//! values from a stable hash of (attribute, cell, window), and sampling
//! enumerates frame-major rows exactly like the remote service. Two runs
//! against the same seed state produce identical results, which is what the
//! pipeline's idempotence guarantees are tested against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use geo::Polygon;

use super::types::{
    BackendError, ClassCell, ClassCompositeRequest, ClassGrid, GroupSum, MaskedCompositeRequest,
    RasterRef, ReduceRegionRequest, Reducer, SamplePage, SamplePageRequest, SampleRow,
};
use super::GeoBackend;
use crate::calendar::{self, DateRange};
use crate::geometry;
use crate::landclass::{LandClass, NO_DATA_VALUE};

/// One composited raster held by the memory backend.
#[derive(Debug, Clone)]
struct StoredRaster {
    attributes: Vec<String>,
    /// Per-attribute, per-cell values, aligned to the masking raster's cell
    /// order at composite time.
    values: Vec<Vec<f64>>,
}

/// Record of one masked composite request, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLogEntry {
    pub dataset: String,
    pub window: Option<DateRange>,
    pub reducer: Reducer,
    pub fill: Option<f64>,
    pub mode_attribute: Option<String>,
    pub constant: Option<(String, f64)>,
}

#[derive(Default)]
struct Inner {
    rasters: HashMap<String, StoredRaster>,
    next_raster: u64,
    failures: Vec<BackendError>,
    composite_log: Vec<CompositeLogEntry>,
}

/// In-memory [`GeoBackend`] implementation.
///
/// Seed it with cell centers and per-window dominant classes, then run the
/// pipeline against it:
///
/// ```
/// use landshift::backend::MemoryBackend;
/// use landshift::calendar;
///
/// let cells = vec![(-124.1450, 41.1150), (-124.1449, 41.1150)];
/// let backend = MemoryBackend::new(10.0)
///     .with_cells(cells)
///     .with_class_window(calendar::before_window(2018), vec![1, 6])
///     .with_class_window(calendar::after_window(2018), vec![6, 2]);
/// # let _ = backend;
/// ```
pub struct MemoryBackend {
    scale_m: f64,
    cells: Vec<(f64, f64)>,
    class_windows: Vec<(DateRange, Vec<i16>)>,
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(scale_m: f64) -> Self {
        Self {
            scale_m,
            cells: Vec::new(),
            class_windows: Vec::new(),
            inner: Mutex::new(Inner::default()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Seeds the cell centers of the synthetic grid.
    pub fn with_cells(mut self, cells: Vec<(f64, f64)>) -> Self {
        self.cells = cells;
        self
    }

    /// Seeds the dominant class of every cell for one composite window.
    ///
    /// `values` must align with the seeded cells. Windows without a seed
    /// behave as fully unobserved (every cell no-data).
    pub fn with_class_window(mut self, window: DateRange, values: Vec<i16>) -> Self {
        assert_eq!(
            values.len(),
            self.cells.len(),
            "class values must align with seeded cells"
        );
        self.class_windows.push((window, values));
        self
    }

    /// Queues an error returned by the next backend call.
    ///
    /// Queued failures are consumed in order, one per call, before any real
    /// work happens.
    pub fn fail_next(&self, error: BackendError) {
        self.inner.lock().unwrap().failures.push(error);
    }

    /// Total number of backend calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Masked composite requests seen so far.
    pub fn composite_log(&self) -> Vec<CompositeLogEntry> {
        self.inner.lock().unwrap().composite_log.clone()
    }

    /// Cell centers spaced `scale_m` apart covering a polygon's bounding
    /// box. Convenience for seeding test grids.
    pub fn grid_cells(polygon: &Polygon<f64>, scale_m: f64) -> Vec<(f64, f64)> {
        let bounds = geometry::Bounds::from_polygon(polygon);
        if bounds.is_empty() {
            return Vec::new();
        }

        let mid_lat = (bounds.min_lat + bounds.max_lat) / 2.0;
        let lat_step = scale_m / 111_320.0;
        let lon_step = lat_step / mid_lat.to_radians().cos().max(1e-9);

        let mut cells = Vec::new();
        let mut lat = bounds.min_lat + lat_step / 2.0;
        while lat < bounds.max_lat {
            let mut lon = bounds.min_lon + lon_step / 2.0;
            while lon < bounds.max_lon {
                cells.push((lon, lat));
                lon += lon_step;
            }
            lat += lat_step;
        }
        cells
    }

    fn begin_call(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        if inner.failures.is_empty() {
            Ok(())
        } else {
            Err(inner.failures.remove(0))
        }
    }
}

/// Stable synthetic value for one attribute of one cell in one window.
fn synth_value(attribute: &str, cell_index: usize, day_seed: i64) -> f64 {
    let attribute_seed = attribute
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    (attribute_seed % 97) as f64
        + cell_index as f64 * 0.01
        + day_seed.rem_euclid(365) as f64 * 0.1
}

impl GeoBackend for MemoryBackend {
    fn class_composite(
        &self,
        request: &ClassCompositeRequest<'_>,
    ) -> Result<ClassGrid, BackendError> {
        self.begin_call()?;

        let values = self
            .class_windows
            .iter()
            .find(|(window, _)| *window == request.window)
            .map(|(_, values)| values.clone())
            .unwrap_or_else(|| vec![NO_DATA_VALUE; self.cells.len()]);

        Ok(ClassGrid {
            scale_m: self.scale_m,
            cells: self
                .cells
                .iter()
                .zip(values)
                .map(|(&(longitude, latitude), value)| ClassCell {
                    longitude,
                    latitude,
                    value,
                })
                .collect(),
        })
    }

    fn masked_composite(
        &self,
        request: &MaskedCompositeRequest<'_>,
    ) -> Result<RasterRef, BackendError> {
        self.begin_call()?;

        let day_seed = request
            .window
            .map(|window| calendar::day_ordinal(window.start))
            .unwrap_or(0);
        let cell_count = request.change.len();

        let mut attributes: Vec<String> = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();

        for &attribute in request.attributes {
            let cells = (0..cell_count)
                .map(|cell_index| match request.fill {
                    // Simulate sparse coverage for fill-aware datasets.
                    Some(fill) if (cell_index as i64 + day_seed) % 11 == 0 => fill,
                    _ => synth_value(attribute, cell_index, day_seed),
                })
                .collect();
            attributes.push(attribute.to_string());
            values.push(cells);
        }

        if let Some(mode_attribute) = request.mode_attribute {
            attributes.push(format!("{}_mode", mode_attribute));
            values.push(
                (0..cell_count)
                    .map(|cell_index| (cell_index % LandClass::COUNT) as f64)
                    .collect(),
            );
        }

        if let Some((name, value)) = request.constant {
            attributes.push(name.to_string());
            values.push(vec![value; cell_count]);
        }

        let mut inner = self.inner.lock().unwrap();
        inner.composite_log.push(CompositeLogEntry {
            dataset: request.dataset.to_string(),
            window: request.window,
            reducer: request.reducer,
            fill: request.fill,
            mode_attribute: request.mode_attribute.map(str::to_string),
            constant: request.constant.map(|(name, value)| (name.to_string(), value)),
        });

        let id = format!("raster-{}", inner.next_raster);
        inner.next_raster += 1;
        inner.rasters.insert(
            id.clone(),
            StoredRaster {
                attributes: attributes.clone(),
                values,
            },
        );

        Ok(RasterRef {
            id,
            attributes,
            footprint: request.change.footprint(),
        })
    }

    fn reduce_region(
        &self,
        request: &ReduceRegionRequest<'_>,
    ) -> Result<Vec<GroupSum>, BackendError> {
        self.begin_call()?;

        let mut sums: HashMap<i32, f64> = HashMap::new();
        for cell in request.change.cells() {
            let area = geometry::cell_area_m2(cell.longitude, cell.latitude, request.scale_m);
            *sums.entry(cell.category.code() as i32).or_insert(0.0) += area;
        }

        let mut groups: Vec<GroupSum> = sums
            .into_iter()
            .map(|(group, sum)| GroupSum { group, sum })
            .collect();
        groups.sort_by_key(|group| group.group);
        Ok(groups)
    }

    fn sample_page(&self, request: &SamplePageRequest<'_>) -> Result<SamplePage, BackendError> {
        self.begin_call()?;

        let inner = self.inner.lock().unwrap();
        let cells = request.change.cells();
        let total = request.frames.len() * cells.len();

        let start = request.offset.min(total);
        let end = (request.offset + request.page_size).min(total);

        let mut rows = Vec::with_capacity(end - start);
        for index in start..end {
            let frame = &request.frames[index / cells.len()];
            let cell_index = index % cells.len();
            let cell = &cells[cell_index];

            let mut row = SampleRow::default();
            row.values.insert(
                "date".to_string(),
                serde_json::Value::String(frame.timestamp.format("%Y-%m-%d").to_string()),
            );
            row.values.insert("longitude".to_string(), json_f64(cell.longitude));
            row.values.insert("latitude".to_string(), json_f64(cell.latitude));
            row.values
                .insert("change".to_string(), serde_json::Value::from(cell.category.code()));

            for raster in &frame.rasters {
                let stored = inner.rasters.get(&raster.id).ok_or_else(|| {
                    BackendError::Contract(format!("unknown raster id {}", raster.id))
                })?;
                for (attribute, cells_values) in stored.attributes.iter().zip(&stored.values) {
                    row.values
                        .insert(attribute.clone(), json_f64(cells_values[cell_index]));
                }
            }

            rows.push(row);
        }

        Ok(SamplePage {
            rows,
            exhausted: end >= total,
        })
    }

    fn polygon_area(&self, polygon: &Polygon<f64>) -> Result<f64, BackendError> {
        self.begin_call()?;
        Ok(geometry::geodesic_area_m2(polygon))
    }
}

fn json_f64(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{after_window, before_window};
    use crate::change::ChangeRaster;
    use crate::geometry::polygon_from_ring;
    use chrono::NaiveDate;

    fn test_polygon() -> Polygon<f64> {
        polygon_from_ring(&[
            (-124.1451, 41.1181),
            (-124.1451, 41.1146),
            (-124.1394, 41.1146),
            (-124.1394, 41.1181),
        ])
        .unwrap()
    }

    fn seeded_backend() -> MemoryBackend {
        let polygon = test_polygon();
        let cells = MemoryBackend::grid_cells(&polygon, 100.0);
        let before: Vec<i16> = cells.iter().enumerate().map(|(i, _)| (i % 9) as i16).collect();
        let after: Vec<i16> = cells.iter().map(|_| 6).collect();
        MemoryBackend::new(100.0)
            .with_cells(cells)
            .with_class_window(before_window(2018), before)
            .with_class_window(after_window(2018), after)
    }

    fn change_raster(backend: &MemoryBackend) -> ChangeRaster {
        let polygon = test_polygon();
        let before = backend
            .class_composite(&ClassCompositeRequest {
                dataset: "GOOGLE/DYNAMICWORLD/V1",
                window: before_window(2018),
                polygon: &polygon,
                scale_m: 100.0,
            })
            .unwrap();
        let after = backend
            .class_composite(&ClassCompositeRequest {
                dataset: "GOOGLE/DYNAMICWORLD/V1",
                window: after_window(2018),
                polygon: &polygon,
                scale_m: 100.0,
            })
            .unwrap();
        ChangeRaster::from_grids(&before, &after).unwrap()
    }

    #[test]
    fn test_grid_cells_cover_polygon() {
        let polygon = test_polygon();
        let cells = MemoryBackend::grid_cells(&polygon, 100.0);
        assert!(!cells.is_empty());
        // ~477 m x ~389 m box at 100 m spacing.
        assert!(cells.len() < 50, "unexpectedly many cells: {}", cells.len());
    }

    #[test]
    fn test_unseeded_window_is_unobserved() {
        let backend = seeded_backend();
        let polygon = test_polygon();
        let grid = backend
            .class_composite(&ClassCompositeRequest {
                dataset: "GOOGLE/DYNAMICWORLD/V1",
                window: before_window(1999),
                polygon: &polygon,
                scale_m: 100.0,
            })
            .unwrap();
        assert!(grid.cells.iter().all(|cell| cell.value == NO_DATA_VALUE));
    }

    #[test]
    fn test_masked_composite_is_deterministic() {
        let backend = seeded_backend();
        let polygon = test_polygon();
        let change = change_raster(&backend);

        let request = MaskedCompositeRequest {
            dataset: "IDAHO_EPSCOR/GRIDMET",
            attributes: &["tmmn", "tmmx"],
            window: Some(before_window(2018)),
            reducer: Reducer::Mean,
            fill: None,
            mode_attribute: None,
            constant: None,
            change: &change,
            polygon: &polygon,
            scale_m: 100.0,
        };

        let first = backend.masked_composite(&request).unwrap();
        let second = backend.masked_composite(&request).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.attributes, second.attributes);

        let inner = backend.inner.lock().unwrap();
        assert_eq!(
            inner.rasters[&first.id].values,
            inner.rasters[&second.id].values
        );
    }

    #[test]
    fn test_sample_pagination_is_exhaustive_and_ordered() {
        let backend = seeded_backend();
        let polygon = test_polygon();
        let change = change_raster(&backend);
        assert!(!change.is_empty());

        let raster = backend
            .masked_composite(&MaskedCompositeRequest {
                dataset: "IDAHO_EPSCOR/GRIDMET",
                attributes: &["tmmn"],
                window: Some(before_window(2018)),
                reducer: Reducer::Mean,
                fill: None,
                mode_attribute: None,
                constant: None,
                change: &change,
                polygon: &polygon,
                scale_m: 100.0,
            })
            .unwrap();

        let frames = vec![
            super::super::types::SampleFrame {
                timestamp: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
                rasters: vec![&raster],
            },
            super::super::types::SampleFrame {
                timestamp: NaiveDate::from_ymd_opt(2018, 1, 9).unwrap(),
                rasters: vec![&raster],
            },
        ];

        let total = 2 * change.len();
        let page_size = total - 1; // force two pages
        let first = backend
            .sample_page(&SamplePageRequest {
                frames: &frames,
                change: &change,
                polygon: &polygon,
                scale_m: 100.0,
                projection: "EPSG:4326",
                page_size,
                offset: 0,
            })
            .unwrap();
        assert_eq!(first.rows.len(), page_size);
        assert!(!first.exhausted);

        let second = backend
            .sample_page(&SamplePageRequest {
                frames: &frames,
                change: &change,
                polygon: &polygon,
                scale_m: 100.0,
                projection: "EPSG:4326",
                page_size,
                offset: page_size,
            })
            .unwrap();
        assert_eq!(second.rows.len(), 1);
        assert!(second.exhausted);

        // First row carries the first frame's date; last row the second's.
        assert_eq!(
            first.rows[0].values["date"],
            serde_json::Value::String("2018-01-01".into())
        );
        assert_eq!(
            second.rows[0].values["date"],
            serde_json::Value::String("2018-01-09".into())
        );
    }

    #[test]
    fn test_reduce_region_groups_by_category() {
        let backend = seeded_backend();
        let polygon = test_polygon();
        let change = change_raster(&backend);

        let groups = backend
            .reduce_region(&ReduceRegionRequest {
                change: &change,
                polygon: &polygon,
                grouping: "change",
                scale_m: 100.0,
                projection: "EPSG:32610",
            })
            .unwrap();

        assert!(!groups.is_empty());
        assert!(groups.iter().all(|group| group.sum > 0.0));
        // Sorted ascending by group code.
        assert!(groups.windows(2).all(|pair| pair[0].group < pair[1].group));
    }
}
