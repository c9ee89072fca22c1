//! CLI error type and exit codes.

use landshift::analysis::AnalysisError;
use landshift::config::ConfigError;
use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    /// The caller can fix the input (bad polygon, oversized region, …).
    #[error("{0}")]
    Input(String),

    /// The remote compute service failed.
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("polygon file error: {0}")]
    PolygonFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Input problems exit 2, backend failures exit 3, everything else 1,
    /// so scripts can distinguish "fix your polygon" from "try again later".
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input(_) | CliError::PolygonFile(_) => 2,
            CliError::Backend(_) => 3,
            CliError::Config(_) | CliError::Io(_) => 1,
        }
    }
}

impl From<AnalysisError> for CliError {
    fn from(error: AnalysisError) -> Self {
        if error.is_input_rejection() {
            CliError::Input(error.to_string())
        } else {
            CliError::Backend(error.to_string())
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Config(error.to_string())
    }
}
