//! Batched materialization of the inference table.
//!
//! The joined row-set lives on the backend; this stage pulls it down in
//! fixed-size pages and types each raw row against the schema. Pagination
//! terminates on the backend's explicit exhaustion signal (or an empty
//! page), never by interpreting an error as end-of-data.

use tracing::{info, warn};

use super::schema::{self, Datum, InferenceTable};
use crate::backend::{BackendError, GeoBackend, SampleFrame, SamplePageRequest, SAMPLE_PROJECTION};
use crate::context::RunContext;
use crate::join::JoinedSnapshot;

/// Rows requested per page.
pub const PAGE_SIZE: usize = 5_000;

/// Materializes the joined snapshots into the typed inference table.
///
/// Pages are requested sequentially and concatenated in request order. An
/// empty row-set — no joined snapshots, no covered cells, or a backend
/// row-set that turns out empty — yields the single all-null placeholder
/// row so consumers always see the full column set.
pub fn materialize<B: GeoBackend>(
    backend: &B,
    ctx: &RunContext<'_>,
    joined: &[JoinedSnapshot],
) -> Result<InferenceTable, BackendError> {
    if joined.is_empty() || ctx.change.is_empty() {
        info!(year = ctx.year, "Nothing to materialize; returning placeholder row");
        return Ok(InferenceTable::placeholder());
    }

    let frames: Vec<SampleFrame<'_>> = joined
        .iter()
        .map(|snapshot| {
            let mut rasters = vec![&snapshot.climate.raster];
            if let Some(leaf) = &snapshot.leaf {
                rasters.push(&leaf.raster);
            }
            if let Some(land) = &snapshot.land_probability {
                rasters.push(&land.raster);
            }
            rasters.push(&snapshot.elevation);
            SampleFrame {
                timestamp: snapshot.timestamp(),
                rasters,
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut offset = 0;
    let mut pages = 0;
    loop {
        let page = backend.sample_page(&SamplePageRequest {
            frames: &frames,
            change: ctx.change,
            polygon: ctx.polygon,
            scale_m: ctx.scale_m,
            projection: SAMPLE_PROJECTION,
            page_size: PAGE_SIZE,
            offset,
        })?;
        pages += 1;

        let fetched = page.rows.len();
        for raw in &page.rows {
            let row = schema::convert_row(raw);
            // Covered cells always carry a tracked category; anything else
            // means the backend ignored the mask.
            match row.get("change") {
                Some(Datum::Category(code)) if *code != 0 => rows.push(row),
                other => {
                    warn!(change = ?other, "Dropping sample row outside the change mask");
                }
            }
        }

        offset += fetched;
        if page.exhausted || fetched == 0 {
            break;
        }
    }

    if rows.is_empty() {
        info!(year = ctx.year, pages, "Row-set empty; returning placeholder row");
        return Ok(InferenceTable::placeholder());
    }

    info!(year = ctx.year, pages, rows = rows.len(), "Materialization complete");
    Ok(InferenceTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        ClassCompositeRequest, ClassGrid, GroupSum, MaskedCompositeRequest, RasterRef,
        ReduceRegionRequest, SamplePage, SampleRow,
    };
    use crate::change::ChangeRaster;
    use crate::geometry::{polygon_from_ring, Bounds};
    use crate::sources::Snapshot;
    use geo::Polygon;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double serving a fixed number of synthetic rows.
    struct PagingBackend {
        total_rows: usize,
        page_calls: AtomicUsize,
    }

    impl PagingBackend {
        fn new(total_rows: usize) -> Self {
            Self {
                total_rows,
                page_calls: AtomicUsize::new(0),
            }
        }
    }

    impl GeoBackend for PagingBackend {
        fn class_composite(
            &self,
            _request: &ClassCompositeRequest<'_>,
        ) -> Result<ClassGrid, BackendError> {
            unimplemented!("not used by materialization tests")
        }

        fn masked_composite(
            &self,
            _request: &MaskedCompositeRequest<'_>,
        ) -> Result<RasterRef, BackendError> {
            unimplemented!("not used by materialization tests")
        }

        fn reduce_region(
            &self,
            _request: &ReduceRegionRequest<'_>,
        ) -> Result<Vec<GroupSum>, BackendError> {
            unimplemented!("not used by materialization tests")
        }

        fn sample_page(&self, request: &SamplePageRequest<'_>) -> Result<SamplePage, BackendError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            let start = request.offset.min(self.total_rows);
            let end = (request.offset + request.page_size).min(self.total_rows);
            let rows = (start..end)
                .map(|index| SampleRow {
                    values: [
                        ("date".to_string(), json!("2018-06-01")),
                        ("tmmn".to_string(), json!(270.0 + index as f64)),
                        ("change".to_string(), json!(1)),
                    ]
                    .into_iter()
                    .collect(),
                })
                .collect();
            Ok(SamplePage {
                rows,
                exhausted: end >= self.total_rows,
            })
        }

        fn polygon_area(&self, _polygon: &Polygon<f64>) -> Result<f64, BackendError> {
            unimplemented!("not used by materialization tests")
        }
    }

    fn test_polygon() -> Polygon<f64> {
        polygon_from_ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap()
    }

    fn non_empty_change() -> ChangeRaster {
        use crate::backend::ClassCell;
        let cell = |value| ClassGrid {
            scale_m: 10.0,
            cells: vec![ClassCell {
                longitude: 0.5,
                latitude: 0.5,
                value,
            }],
        };
        ChangeRaster::from_grids(&cell(1), &cell(6)).unwrap()
    }

    fn joined_snapshot() -> JoinedSnapshot {
        let raster = |id: &str| RasterRef {
            id: id.to_string(),
            attributes: vec![],
            footprint: Bounds {
                min_lon: 0.0,
                min_lat: 0.0,
                max_lon: 1.0,
                max_lat: 1.0,
            },
        };
        JoinedSnapshot {
            climate: Snapshot {
                timestamp: chrono::NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
                raster: raster("climate"),
            },
            leaf: None,
            land_probability: None,
            elevation: raster("elevation"),
        }
    }

    #[test]
    fn test_ten_thousand_rows_take_exactly_two_pages() {
        let backend = PagingBackend::new(10_000);
        let polygon = test_polygon();
        let change = non_empty_change();
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &change,
            scale_m: 10.0,
        };

        let table = materialize(&backend, &ctx, &[joined_snapshot()]).unwrap();

        assert_eq!(backend.page_calls.load(Ordering::SeqCst), 2);
        assert_eq!(table.len(), 10_000);

        // Concatenated in request order with no duplicates or gaps.
        let values: Vec<f64> = table
            .rows()
            .iter()
            .map(|row| match row.get("tmmn") {
                Some(Datum::Float(value)) => *value,
                other => panic!("unexpected tmmn datum: {:?}", other),
            })
            .collect();
        assert_eq!(values[0], 270.0);
        assert_eq!(values[9_999], 270.0 + 9_999.0);
        assert!(values.windows(2).all(|pair| pair[1] - pair[0] == 1.0));
    }

    #[test]
    fn test_empty_row_set_yields_single_placeholder_row() {
        let backend = PagingBackend::new(0);
        let polygon = test_polygon();
        let change = non_empty_change();
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &change,
            scale_m: 10.0,
        };

        let table = materialize(&backend, &ctx, &[joined_snapshot()]).unwrap();

        assert!(table.is_placeholder());
        assert_eq!(table.len(), 1);
        assert_eq!(backend.page_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_joined_snapshots_skips_the_backend() {
        let backend = PagingBackend::new(10);
        let polygon = test_polygon();
        let change = non_empty_change();
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &change,
            scale_m: 10.0,
        };

        let table = materialize(&backend, &ctx, &[]).unwrap();

        assert!(table.is_placeholder());
        assert_eq!(backend.page_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_short_final_page_terminates() {
        let backend = PagingBackend::new(PAGE_SIZE + 123);
        let polygon = test_polygon();
        let change = non_empty_change();
        let ctx = RunContext {
            polygon: &polygon,
            year: 2018,
            change: &change,
            scale_m: 10.0,
        };

        let table = materialize(&backend, &ctx, &[joined_snapshot()]).unwrap();

        assert_eq!(table.len(), PAGE_SIZE + 123);
        assert_eq!(backend.page_calls.load(Ordering::SeqCst), 2);
    }
}
