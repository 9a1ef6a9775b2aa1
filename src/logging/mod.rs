//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable log levels
//! - JSON-formatted local log files with rotation
//!
//! # Example
//!
//! ```no_run
//! use swimbest::logging::init_logging;
//! use swimbest::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! tracing::warn!(athlete_id = "1003542", "No pool results found");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a race analysis
///
/// # Example
///
/// ```no_run
/// use swimbest::log_race_start;
/// use swimbest::domain::RaceId;
///
/// let race_id = RaceId::new("4725").unwrap();
/// log_race_start!(&race_id, 32);
/// ```
#[macro_export]
macro_rules! log_race_start {
    ($race_id:expr, $athletes:expr) => {
        tracing::info!(
            race_id = %$race_id,
            athletes = $athletes,
            "Starting race analysis"
        );
    };
}

/// Log the completion of a race analysis
///
/// # Example
///
/// ```no_run
/// use swimbest::log_race_complete;
/// use std::time::Duration;
///
/// log_race_complete!("4725", 96, Duration::from_secs(12));
/// ```
#[macro_export]
macro_rules! log_race_complete {
    ($race_id:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            race_id = %$race_id,
            rows = $rows,
            duration_ms = $duration.as_millis(),
            "Race analysis completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use swimbest::log_error_with_context;
/// use swimbest::domain::SwimbestError;
///
/// let error = SwimbestError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use swimbest::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
