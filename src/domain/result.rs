//! Result type alias for Swimbest
//!
//! This module provides a convenient Result type alias that uses SwimbestError
//! as the error type.

use super::errors::SwimbestError;

/// Result type alias for Swimbest operations
///
/// # Examples
///
/// ```
/// use swimbest::domain::result::Result;
/// use swimbest::domain::errors::SwimbestError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SwimbestError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SwimbestError>;
