use std::path::PathBuf;
use thiserror::Error;

/// Invalid steering configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("force factor must be positive and finite, got {0}")]
    InvalidForceFactor(f64),
    #[error("{name} must be a positive, finite duration")]
    InvalidInterval { name: &'static str },
    #[error("environment variable {key}={value:?} is not a number")]
    InvalidEnv { key: &'static str, value: String },
}

/// Errors while loading a recorded tilt trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("line {line}: timestamp {timestamp}s goes backwards")]
    NonMonotonic { line: usize, timestamp: f64 },
    #[error("trace contains no samples")]
    Empty,
}
