//! CLI command implementations.

pub mod area;
pub mod check;
pub mod config;
pub mod export;

use std::path::Path;

use landshift::analysis::ChangeAnalysis;
use landshift::backend::{ReqwestClient, RestBackend};
use landshift::config::ConfigFile;

use crate::error::CliError;

/// Loads configuration from an explicit path or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => Ok(ConfigFile::load_from(path)?),
        None => Ok(ConfigFile::load()?),
    }
}

/// Builds the analysis pipeline against the configured compute service.
pub fn build_analysis(
    config: &ConfigFile,
) -> Result<ChangeAnalysis<RestBackend<ReqwestClient>>, CliError> {
    if config.backend.endpoint.is_empty() {
        return Err(CliError::Config(
            "no backend endpoint configured; set backend.endpoint in the config file".to_string(),
        ));
    }

    let http = ReqwestClient::with_timeout(config.backend.timeout_secs)
        .map_err(|e| CliError::Backend(e.to_string()))?;
    let mut backend = RestBackend::new(http, config.backend.endpoint.clone());
    if let Some(api_key) = &config.backend.api_key {
        backend = backend.with_api_key(api_key.clone());
    }

    Ok(ChangeAnalysis::new(backend, config.analysis_config()))
}

/// Reads a polygon ring from a JSON file of `[[longitude, latitude], …]`.
pub fn read_ring(path: &Path) -> Result<Vec<(f64, f64)>, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::PolygonFile(format!("{}: {}", path.display(), e)))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| CliError::PolygonFile(format!("{}: {}", path.display(), e)))?;

    let pairs = value
        .as_array()
        .ok_or_else(|| CliError::PolygonFile("expected a JSON array of [lon, lat] pairs".into()))?;

    let mut ring = Vec::with_capacity(pairs.len());
    for (index, pair) in pairs.iter().enumerate() {
        let coords = pair.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
            CliError::PolygonFile(format!("entry {} is not a [lon, lat] pair", index))
        })?;
        let longitude = coords[0]
            .as_f64()
            .ok_or_else(|| CliError::PolygonFile(format!("entry {} has a non-numeric longitude", index)))?;
        let latitude = coords[1]
            .as_f64()
            .ok_or_else(|| CliError::PolygonFile(format!("entry {} has a non-numeric latitude", index)))?;
        ring.push((longitude, latitude));
    }

    Ok(ring)
}

/// Formats square meters for terminal output.
pub fn format_area(area_m2: f64) -> String {
    if area_m2 >= 1.0e6 {
        format!("{:.3} km²", area_m2 / 1.0e6)
    } else {
        format!("{:.0} m²", area_m2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_ring_valid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[-124.1451, 41.1181], [-124.1451, 41.1146], [-124.1394, 41.1146]]").unwrap();

        let ring = read_ring(file.path()).unwrap();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring[0], (-124.1451, 41.1181));
    }

    #[test]
    fn test_read_ring_rejects_malformed_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[-124.1451], [41.0, 1.0]]").unwrap();

        let err = read_ring(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_format_area() {
        assert_eq!(format_area(500.0), "500 m²");
        assert_eq!(format_area(2_500_000.0), "2.500 km²");
    }

    #[test]
    fn test_unconfigured_endpoint_is_rejected() {
        let config = ConfigFile::default();
        let err = build_analysis(&config).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
