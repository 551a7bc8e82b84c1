use std::io;

use thiserror::Error;

/// Failures loading or validating a `DispatchConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A job/worker count could not be obtained from the data provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemandLookupError {
    #[error("Demand source unavailable: {0}")]
    Unavailable(String),
    #[error("Demand lookup timed out")]
    Timeout,
}
