//! Configuration management for Swimbest.
//!
//! Swimbest uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SWIMBEST_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`UpstreamConfig`] - Results service URL, headers, timeout, retries, endpoint templates
//! - [`PipelineConfig`] - Worker pool size, course policy, target events
//! - [`CacheConfig`] - Durable cache directory and TTL
//! - [`RaceConfig`] - Open-water races to analyse
//! - [`OutputConfig`] - Output file
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [upstream]
//! base_url = "https://api.worldaquatics.com/fina"
//! timeout_seconds = 30
//!
//! [upstream.retry]
//! max_retries = 3
//! initial_delay_ms = 500
//!
//! [upstream.endpoints]
//! athlete_history = ["athletes/{athlete_id}/results"]
//! race_results = ["events/{race_id}"]
//!
//! [pipeline]
//! workers = 8
//! course_policy = "strict"
//!
//! [cache]
//! directory = "./cache/athletes"
//! # ttl_seconds omitted: entries never expire
//!
//! [[races]]
//! race_id = "b2d5c1a4-0000-0000-0000-000000000000"
//! reference_date = "2025-07-17"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CacheConfig, CoursePolicy, EndpointConfig, LoggingConfig, OutputConfig,
    PipelineConfig, RaceConfig, RetryConfig, SwimbestConfig, UpstreamConfig,
};
