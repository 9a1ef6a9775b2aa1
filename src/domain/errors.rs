//! Domain error types
//!
//! This module defines the error hierarchy for Swimbest.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Swimbest error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SwimbestError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream results service errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Entity cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Race or athlete pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Upstream fetch errors
///
/// Errors that occur when talking to the results service.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Failed to connect to the results service
    #[error("Failed to connect to results service: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Body was not usable JSON
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Endpoint template could not be turned into a URL
    #[error("Invalid endpoint template: {0}")]
    InvalidEndpoint(String),

    /// Every candidate endpoint failed with a transport or server error
    #[error("All {attempted} endpoint(s) unreachable, last error: {last_error}")]
    Unreachable { attempted: usize, last_error: String },
}

impl FetchError {
    /// Whether another attempt against the same URL could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::ConnectionFailed(_) | FetchError::Timeout(_) => true,
            FetchError::ServerError { .. } => true,
            FetchError::ClientError { status, .. } => *status == 429,
            FetchError::InvalidResponse(_)
            | FetchError::InvalidEndpoint(_)
            | FetchError::Unreachable { .. } => false,
        }
    }
}

/// Entity cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Durable entry could not be read
    #[error("Failed to read cache entry {key}: {message}")]
    Read { key: String, message: String },

    /// Durable entry could not be written
    #[error("Failed to write cache entry {key}: {message}")]
    Write { key: String, message: String },

    /// Durable entry exists but is structurally invalid
    #[error("Corrupt cache entry {key}: {message}")]
    Corrupt { key: String, message: String },
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The race has no determinable reference date and cannot be analysed
    #[error("Race {race_id} has no determinable reference date")]
    MissingReferenceDate { race_id: String },

    /// An athlete task panicked or was aborted
    #[error("Athlete task for {athlete_id} did not complete: {message}")]
    TaskAborted { athlete_id: String, message: String },
}

// Conversion from std::io::Error
impl From<std::io::Error> for SwimbestError {
    fn from(err: std::io::Error) -> Self {
        SwimbestError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SwimbestError {
    fn from(err: serde_json::Error) -> Self {
        SwimbestError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SwimbestError {
    fn from(err: toml::de::Error) -> Self {
        SwimbestError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swimbest_error_display() {
        let err = SwimbestError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_fetch_error_conversion() {
        let fetch_err = FetchError::ConnectionFailed("Network error".to_string());
        let err: SwimbestError = fetch_err.into();
        assert!(matches!(err, SwimbestError::Fetch(_)));
    }

    #[test]
    fn test_pipeline_error_conversion() {
        let pipeline_err = PipelineError::MissingReferenceDate {
            race_id: "3328".to_string(),
        };
        let err: SwimbestError = pipeline_err.into();
        assert!(matches!(err, SwimbestError::Pipeline(_)));
        assert!(err.to_string().contains("3328"));
    }

    #[test]
    fn test_fetch_error_retryable() {
        assert!(FetchError::Timeout("30s".to_string()).is_retryable());
        assert!(FetchError::ServerError {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(FetchError::ClientError {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!FetchError::ClientError {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!FetchError::InvalidResponse("empty".to_string()).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SwimbestError = io_err.into();
        assert!(matches!(err, SwimbestError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SwimbestError = json_err.into();
        assert!(matches!(err, SwimbestError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: SwimbestError = toml_err.into();
        assert!(matches!(err, SwimbestError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
