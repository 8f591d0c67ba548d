//! Error types for butterfly-osrm
//!
//! Query failures reported by the engine are not errors: they come back as
//! [`QueryResult::Failure`](crate::QueryResult::Failure). Everything here is a
//! fault of the binding layer, the transport, or the engine's lifecycle.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::Algorithm;

/// Main error type for butterfly-osrm operations
#[derive(Debug, Error)]
pub enum Error {
    /// No dataset files exist at the given base path
    #[error("Dataset '{}' not found", path.display())]
    DatasetNotFound { path: PathBuf },

    /// The dataset exists but was not prepared for the selected algorithm
    #[error(
        "Dataset '{}' is not prepared for {algorithm} (missing {})",
        path.display(),
        missing.join(", ")
    )]
    IncompatibleDataset {
        path: PathBuf,
        algorithm: Algorithm,
        missing: Vec<String>,
    },

    /// The routing engine could not be started or never became ready
    #[error("Engine startup failed: {0}")]
    EngineStartup(String),

    /// A query was issued before any engine was initialized
    #[error("Engine not initialized: call initialize() before querying")]
    NotInitialized,

    /// Longitude and latitude lists differ in length
    #[error("Coordinate lists differ in length: {longitudes} longitudes, {latitudes} latitudes")]
    CoordinateMismatch { longitudes: usize, latitudes: usize },

    /// A coordinate component is NaN or infinite
    #[error("Invalid coordinate ({longitude}, {latitude})")]
    InvalidCoordinate { longitude: f64, latitude: f64 },

    /// Invalid configuration or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The engine answered with a status outside {Ok, Error}
    #[error("Engine returned unclassified status {status}")]
    UnclassifiedStatus { status: u16 },

    /// The engine's answer could not be interpreted
    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    /// Network connectivity issues with the engine endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP-level failure talking to the engine endpoint
    #[error("HTTP error: {0}")]
    Http(String),

    /// File or process I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by the caller's arguments rather than the engine
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Error::CoordinateMismatch { .. } | Error::InvalidCoordinate { .. } | Error::InvalidInput(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::Network(err.to_string())
        } else {
            Error::Http(err.to_string())
        }
    }
}

/// Convenience result type for butterfly-osrm operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_dataset_message_lists_missing_files() {
        let err = Error::IncompatibleDataset {
            path: PathBuf::from("/data/monaco.osrm"),
            algorithm: Algorithm::Mld,
            missing: vec!["monaco.osrm.partition".to_string(), "monaco.osrm.cells".to_string()],
        };

        let text = err.to_string();
        assert!(text.contains("/data/monaco.osrm"));
        assert!(text.contains("MLD"));
        assert!(text.contains("monaco.osrm.partition, monaco.osrm.cells"));
    }

    #[test]
    fn test_argument_errors_are_classified() {
        assert!(Error::CoordinateMismatch { longitudes: 2, latitudes: 1 }.is_argument_error());
        assert!(Error::InvalidCoordinate { longitude: f64::NAN, latitude: 0.0 }.is_argument_error());
        assert!(!Error::NotInitialized.is_argument_error());
        assert!(!Error::UnclassifiedStatus { status: 503 }.is_argument_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "osrm-routed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
