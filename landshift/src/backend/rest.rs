//! HTTP/JSON client for the remote compute service.
//!
//! Requests are POSTed as JSON documents to a versioned endpoint; responses
//! are parsed into the domain types of [`super::types`]. The HTTP transport
//! sits behind the [`HttpClient`] trait so tests can inject a mock instead
//! of a live service.

use geo::Polygon;
use serde::Deserialize;
use serde_json::{json, Value};

use super::types::{
    BackendError, ClassCell, ClassCompositeRequest, ClassGrid, GroupSum, MaskedCompositeRequest,
    RasterRef, ReduceRegionRequest, SampleFrame, SamplePage, SamplePageRequest, SampleRow,
};
use super::GeoBackend;
use crate::change::ChangeRaster;
use crate::geometry::Bounds;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Trait for HTTP POST operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// POSTs a JSON body and returns the parsed JSON response.
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, BackendError>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, BackendError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, BackendError> {
        let response = self.client.post(url).json(body).send().map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(e.to_string())
            } else {
                BackendError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(BackendError::Quota(message));
            }
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .map_err(|e| BackendError::Malformed(format!("response is not JSON: {}", e)))
    }
}

/// Compute backend speaking the HTTP/JSON service protocol.
#[derive(Debug)]
pub struct RestBackend<C: HttpClient> {
    http: C,
    base_url: String,
    api_key: Option<String>,
}

impl<C: HttpClient> RestBackend<C> {
    /// Creates a backend against the given service base URL.
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Attaches an API key, sent as a query parameter on every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn build_url(&self, path: &str) -> String {
        match &self.api_key {
            Some(key) => format!("{}/{}?key={}", self.base_url, path, key),
            None => format!("{}/{}", self.base_url, path),
        }
    }
}

/// Exterior ring of a polygon as `[longitude, latitude]` pairs.
fn ring_json(polygon: &Polygon<f64>) -> Value {
    let ring: Vec<Value> = polygon
        .exterior()
        .coords()
        .map(|coord| json!([coord.x, coord.y]))
        .collect();
    Value::Array(ring)
}

/// Change raster mask as `[longitude, latitude, category]` triples.
fn mask_json(change: &ChangeRaster) -> Value {
    let cells: Vec<Value> = change
        .cells()
        .iter()
        .map(|cell| json!([cell.longitude, cell.latitude, cell.category.code()]))
        .collect();
    json!({
        "scale_m": change.scale_m(),
        "cells": cells,
    })
}

fn frames_json(frames: &[SampleFrame<'_>]) -> Value {
    let frames: Vec<Value> = frames
        .iter()
        .map(|frame| {
            json!({
                "timestamp": frame.timestamp.format("%Y-%m-%d").to_string(),
                "rasters": frame.rasters.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
            })
        })
        .collect();
    Value::Array(frames)
}

#[derive(Deserialize)]
struct ClassGridDto {
    scale_m: f64,
    cells: Vec<ClassCellDto>,
}

#[derive(Deserialize)]
struct ClassCellDto {
    longitude: f64,
    latitude: f64,
    value: i16,
}

#[derive(Deserialize)]
struct RasterRefDto {
    id: String,
    attributes: Vec<String>,
    footprint: [f64; 4],
}

#[derive(Deserialize)]
struct ReduceDto {
    groups: Vec<GroupDto>,
}

#[derive(Deserialize)]
struct GroupDto {
    group: i32,
    sum: f64,
}

#[derive(Deserialize)]
struct SamplePageDto {
    rows: Vec<serde_json::Map<String, Value>>,
    #[serde(default)]
    exhausted: bool,
}

#[derive(Deserialize)]
struct AreaDto {
    area_m2: f64,
}

fn parse<T: serde::de::DeserializeOwned>(value: Value, context: &str) -> Result<T, BackendError> {
    serde_json::from_value(value)
        .map_err(|e| BackendError::Malformed(format!("{}: {}", context, e)))
}

impl<C: HttpClient> GeoBackend for RestBackend<C> {
    fn class_composite(
        &self,
        request: &ClassCompositeRequest<'_>,
    ) -> Result<ClassGrid, BackendError> {
        let body = json!({
            "dataset": request.dataset,
            "window": {
                "start": request.window.start.format("%Y-%m-%d").to_string(),
                "end": request.window.end.format("%Y-%m-%d").to_string(),
            },
            "polygon": ring_json(request.polygon),
            "scale_m": request.scale_m,
            "reducer": "mean_argmax",
        });

        let response = self.http.post_json(&self.build_url("v1/composite/class"), &body)?;
        let dto: ClassGridDto = parse(response, "class composite response")?;

        Ok(ClassGrid {
            scale_m: dto.scale_m,
            cells: dto
                .cells
                .into_iter()
                .map(|cell| ClassCell {
                    longitude: cell.longitude,
                    latitude: cell.latitude,
                    value: cell.value,
                })
                .collect(),
        })
    }

    fn masked_composite(
        &self,
        request: &MaskedCompositeRequest<'_>,
    ) -> Result<RasterRef, BackendError> {
        let window = request.window.map(|window| {
            json!({
                "start": window.start.format("%Y-%m-%d").to_string(),
                "end": window.end.format("%Y-%m-%d").to_string(),
            })
        });
        let body = json!({
            "dataset": request.dataset,
            "attributes": request.attributes,
            "window": window,
            "reducer": request.reducer.as_str(),
            "fill": request.fill,
            "mode_attribute": request.mode_attribute,
            "constant": request.constant.map(|(name, value)| json!({ "name": name, "value": value })),
            "mask": mask_json(request.change),
            "polygon": ring_json(request.polygon),
            "scale_m": request.scale_m,
        });

        let response = self.http.post_json(&self.build_url("v1/composite/masked"), &body)?;
        let dto: RasterRefDto = parse(response, "masked composite response")?;

        Ok(RasterRef {
            id: dto.id,
            attributes: dto.attributes,
            footprint: Bounds {
                min_lon: dto.footprint[0],
                min_lat: dto.footprint[1],
                max_lon: dto.footprint[2],
                max_lat: dto.footprint[3],
            },
        })
    }

    fn reduce_region(
        &self,
        request: &ReduceRegionRequest<'_>,
    ) -> Result<Vec<GroupSum>, BackendError> {
        let body = json!({
            "mask": mask_json(request.change),
            "polygon": ring_json(request.polygon),
            "grouping": request.grouping,
            "scale_m": request.scale_m,
            "projection": request.projection,
        });

        let response = self.http.post_json(&self.build_url("v1/reduce"), &body)?;
        let dto: ReduceDto = parse(response, "reduce response")?;

        Ok(dto
            .groups
            .into_iter()
            .map(|group| GroupSum {
                group: group.group,
                sum: group.sum,
            })
            .collect())
    }

    fn sample_page(&self, request: &SamplePageRequest<'_>) -> Result<SamplePage, BackendError> {
        let body = json!({
            "frames": frames_json(request.frames),
            "mask": mask_json(request.change),
            "polygon": ring_json(request.polygon),
            "scale_m": request.scale_m,
            "projection": request.projection,
            "page_size": request.page_size,
            "offset": request.offset,
        });

        let response = self.http.post_json(&self.build_url("v1/sample"), &body)?;
        let dto: SamplePageDto = parse(response, "sample response")?;

        Ok(SamplePage {
            rows: dto
                .rows
                .into_iter()
                .map(|row| SampleRow {
                    values: row.into_iter().collect(),
                })
                .collect(),
            exhausted: dto.exhausted,
        })
    }

    fn polygon_area(&self, polygon: &Polygon<f64>) -> Result<f64, BackendError> {
        let body = json!({ "polygon": ring_json(polygon) });

        let response = self.http.post_json(&self.build_url("v1/area"), &body)?;
        let dto: AreaDto = parse(response, "area response")?;

        Ok(dto.area_m2)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::calendar::DateRange;
    use crate::geometry::polygon_from_ring;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Mock HTTP client replaying a scripted sequence of responses.
    pub struct MockHttpClient {
        pub responses: Mutex<Vec<Result<Value, BackendError>>>,
        pub requests: Mutex<Vec<(String, Value)>>,
    }

    impl MockHttpClient {
        pub fn new(responses: Vec<Result<Value, BackendError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for MockHttpClient {
        fn post_json(&self, url: &str, body: &Value) -> Result<Value, BackendError> {
            self.requests.lock().unwrap().push((url.to_string(), body.clone()));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(BackendError::Transport("no scripted response".into()));
            }
            responses.remove(0)
        }
    }

    fn test_polygon() -> Polygon<f64> {
        polygon_from_ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap()
    }

    fn test_window() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2017, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2017, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_url_construction_with_api_key() {
        let http = MockHttpClient::new(vec![Ok(json!({ "area_m2": 1.0 }))]);
        let backend = RestBackend::new(http, "https://compute.example.com/").with_api_key("abc");

        backend.polygon_area(&test_polygon()).unwrap();

        let requests = backend.http.requests.lock().unwrap();
        assert_eq!(requests[0].0, "https://compute.example.com/v1/area?key=abc");
    }

    #[test]
    fn test_class_composite_round_trip() {
        let http = MockHttpClient::new(vec![Ok(json!({
            "scale_m": 10.0,
            "cells": [
                { "longitude": 0.1, "latitude": 0.2, "value": 1 },
                { "longitude": 0.3, "latitude": 0.2, "value": -1 },
            ],
        }))]);
        let backend = RestBackend::new(http, "https://compute.example.com");

        let polygon = test_polygon();
        let grid = backend
            .class_composite(&ClassCompositeRequest {
                dataset: "GOOGLE/DYNAMICWORLD/V1",
                window: test_window(),
                polygon: &polygon,
                scale_m: 10.0,
            })
            .unwrap();

        assert_eq!(grid.cells.len(), 2);
        assert_eq!(grid.cells[0].value, 1);
        assert_eq!(grid.cells[1].value, -1);

        let requests = backend.http.requests.lock().unwrap();
        assert_eq!(requests[0].1["window"]["start"], "2017-09-01");
        assert_eq!(requests[0].1["reducer"], "mean_argmax");
    }

    #[test]
    fn test_malformed_response_is_not_transient() {
        let http = MockHttpClient::new(vec![Ok(json!({ "unexpected": true }))]);
        let backend = RestBackend::new(http, "https://compute.example.com");

        let err = backend.polygon_area(&test_polygon()).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_sample_page_defaults_exhausted_to_false() {
        let http = MockHttpClient::new(vec![Ok(json!({
            "rows": [ { "tmmn": 270.0, "change": 1 } ],
        }))]);
        let backend = RestBackend::new(http, "https://compute.example.com");

        let polygon = test_polygon();
        let change = ChangeRaster::empty(10.0);
        let page = backend
            .sample_page(&SamplePageRequest {
                frames: &[],
                change: &change,
                polygon: &polygon,
                scale_m: 10.0,
                projection: super::super::types::SAMPLE_PROJECTION,
                page_size: 5_000,
                offset: 0,
            })
            .unwrap();

        assert_eq!(page.rows.len(), 1);
        assert!(!page.exhausted);
    }

    #[test]
    fn test_transport_error_propagates() {
        let http = MockHttpClient::new(vec![Err(BackendError::Transport("refused".into()))]);
        let backend = RestBackend::new(http, "https://compute.example.com");

        let err = backend.polygon_area(&test_polygon()).unwrap_err();
        assert!(err.is_transient());
    }
}
