//! Configuration file handling.
//!
//! Settings live in an ini file at the platform config directory
//! (`~/.config/landshift/config.ini` on Linux). A missing file means
//! defaults; unknown sections and keys are ignored so older binaries keep
//! working against newer files.
//!
//! ```ini
//! [backend]
//! endpoint = https://compute.example.com
//! api_key = ...
//! timeout_secs = 120
//!
//! [analysis]
//! area_ceiling_m2 = 1e11
//! scale_m = 10
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 250
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::analysis::AnalysisConfig;
use crate::backend::types::PIXEL_SCALE_M;
use crate::backend::RetryPolicy;

/// Default processing ceiling: 100,000 km², roughly the largest region the
/// backend will composite at full resolution without exceeding its pixel
/// quota.
pub const DEFAULT_AREA_CEILING_M2: f64 = 1.0e11;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Errors while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Base URL of the compute service; empty means unconfigured.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Analysis tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub area_ceiling_m2: f64,
    pub scale_m: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            area_ceiling_m2: DEFAULT_AREA_CEILING_M2,
            scale_m: PIXEL_SCALE_M,
        }
    }
}

/// Retry tunables for transient backend failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
        }
    }
}

/// The loaded configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub backend: BackendSettings,
    pub analysis: AnalysisSettings,
    pub retry: RetrySettings,
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("landshift")
        .join("config.ini")
}

impl ConfigFile {
    /// Loads the configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<ConfigFile, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        Self::load_from(&path)
    }

    /// Loads the configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<ConfigFile, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = ConfigFile::default();

        if let Some(section) = ini.section(Some("backend")) {
            if let Some(endpoint) = section.get("endpoint") {
                config.backend.endpoint = endpoint.to_string();
            }
            if let Some(api_key) = section.get("api_key") {
                config.backend.api_key = Some(api_key.to_string());
            }
            if let Some(value) = section.get("timeout_secs") {
                config.backend.timeout_secs = parse_key("backend.timeout_secs", value)?;
            }
        }

        if let Some(section) = ini.section(Some("analysis")) {
            if let Some(value) = section.get("area_ceiling_m2") {
                config.analysis.area_ceiling_m2 = parse_key("analysis.area_ceiling_m2", value)?;
            }
            if let Some(value) = section.get("scale_m") {
                config.analysis.scale_m = parse_key("analysis.scale_m", value)?;
            }
        }

        if let Some(section) = ini.section(Some("retry")) {
            if let Some(value) = section.get("max_attempts") {
                config.retry.max_attempts = parse_key("retry.max_attempts", value)?;
            }
            if let Some(value) = section.get("initial_delay_ms") {
                config.retry.initial_delay_ms = parse_key("retry.initial_delay_ms", value)?;
            }
        }

        Ok(config)
    }

    /// Writes the configuration to the default path, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.save_to(&path)
    }

    /// Writes the configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut ini = Ini::new();

        let mut backend = ini.with_section(Some("backend"));
        backend.set("endpoint", self.backend.endpoint.clone());
        if let Some(api_key) = &self.backend.api_key {
            backend.set("api_key", api_key.clone());
        }
        backend.set("timeout_secs", self.backend.timeout_secs.to_string());

        ini.with_section(Some("analysis"))
            .set("area_ceiling_m2", format!("{}", self.analysis.area_ceiling_m2))
            .set("scale_m", format!("{}", self.analysis.scale_m));

        ini.with_section(Some("retry"))
            .set("max_attempts", self.retry.max_attempts.to_string())
            .set("initial_delay_ms", self.retry.initial_delay_ms.to_string());

        ini.write_to_file(path)?;
        Ok(())
    }

    /// The retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            ..RetryPolicy::default()
        }
    }

    /// The analysis configuration described by this file.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            area_ceiling_m2: self.analysis.area_ceiling_m2,
            scale_m: self.analysis.scale_m,
            retry: self.retry_policy(),
        }
    }
}

fn parse_key<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert!(config.backend.endpoint.is_empty());
        assert_eq!(config.analysis.area_ceiling_m2, DEFAULT_AREA_CEILING_M2);
        assert_eq!(config.analysis.scale_m, PIXEL_SCALE_M);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_overrides_defaults_and_ignores_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[backend]\n\
             endpoint = https://compute.example.com\n\
             api_key = secret\n\
             mystery_key = ignored\n\
             \n\
             [analysis]\n\
             scale_m = 30\n\
             \n\
             [mystery_section]\n\
             foo = bar\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.backend.endpoint, "https://compute.example.com");
        assert_eq!(config.backend.api_key.as_deref(), Some("secret"));
        assert_eq!(config.analysis.scale_m, 30.0);
        // Untouched values keep their defaults.
        assert_eq!(config.analysis.area_ceiling_m2, DEFAULT_AREA_CEILING_M2);
        assert_eq!(config.backend.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_numeric_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[retry]\nmax_attempts = lots\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "retry.max_attempts", .. }));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.backend.endpoint = "https://compute.example.com".to_string();
        config.retry.max_attempts = 5;
        config.save_to(&path).unwrap();

        let reloaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_retry_policy_reflects_settings() {
        let mut config = ConfigFile::default();
        config.retry.max_attempts = 7;
        config.retry.initial_delay_ms = 50;

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
    }
}
