//! Configuration schema types
//!
//! This module defines the configuration structure for Swimbest.

use crate::domain::TargetEvent;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How candidates without any course marker are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoursePolicy {
    /// Unknown course is rejected; only explicit long-course results count
    #[default]
    Strict,
    /// Unknown course is accepted; explicit short-course markers still reject
    Lenient,
}

/// Main Swimbest configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwimbestConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Upstream results service
    pub upstream: UpstreamConfig,

    /// Athlete pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Entity cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Open-water races to analyse
    #[serde(default)]
    pub races: Vec<RaceConfig>,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SwimbestConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.upstream.validate()?;
        self.pipeline.validate()?;
        self.cache.validate()?;
        for race in &self.races {
            race.validate()?;
        }
        self.output.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per endpoint
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Delay before the next attempt, `attempt` counting from 1
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let delay_ms = if delay_ms.is_finite() {
            (delay_ms as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        };
        Duration::from_millis(delay_ms)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("upstream.retry.max_retries must be at least 1".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("upstream.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(
                "upstream.retry.initial_delay_ms cannot exceed max_delay_ms".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Ordered endpoint templates per logical resource
///
/// Templates are tried in order; the first one returning usable JSON wins.
/// Relative templates are joined onto `upstream.base_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Athlete performance history (`{athlete_id}` placeholder)
    #[serde(default = "default_athlete_history_endpoints")]
    pub athlete_history: Vec<String>,

    /// Athlete profile (`{athlete_id}` placeholder)
    #[serde(default = "default_athlete_profile_endpoints")]
    pub athlete_profile: Vec<String>,

    /// Race results (`{race_id}` placeholder)
    #[serde(default = "default_race_results_endpoints")]
    pub race_results: Vec<String>,
}

impl EndpointConfig {
    fn validate(&self) -> Result<(), String> {
        if self.athlete_history.is_empty() && self.athlete_profile.is_empty() {
            return Err(
                "upstream.endpoints must list at least one athlete_history or athlete_profile template"
                    .to_string(),
            );
        }
        for template in self.athlete_history.iter().chain(&self.athlete_profile) {
            if !template.contains("{athlete_id}") {
                return Err(format!(
                    "Athlete endpoint template '{template}' is missing the {{athlete_id}} placeholder"
                ));
            }
        }
        for template in &self.race_results {
            if !template.contains("{race_id}") {
                return Err(format!(
                    "Race endpoint template '{template}' is missing the {{race_id}} placeholder"
                ));
            }
        }
        Ok(())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            athlete_history: default_athlete_history_endpoints(),
            athlete_profile: default_athlete_profile_endpoints(),
            race_results: default_race_results_endpoints(),
        }
    }
}

/// Upstream results service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the results service
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Origin header
    #[serde(default)]
    pub origin: Option<String>,

    /// Referer header
    #[serde(default)]
    pub referer: Option<String>,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Endpoint templates
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl UpstreamConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("upstream.base_url cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("upstream.base_url must start with http:// or https://".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("upstream.timeout_seconds must be greater than 0".to_string());
        }
        self.retry.validate()?;
        self.endpoints.validate()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            origin: Some(default_base_site()),
            referer: Some(default_base_site()),
            retry: RetryConfig::default(),
            endpoints: EndpointConfig::default(),
        }
    }
}

/// Athlete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fixed worker pool size (concurrent athlete tasks)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Treatment of candidates with no course marker
    #[serde(default)]
    pub course_policy: CoursePolicy,

    /// Maximum JSON nesting depth scanned
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Target pool events (labels such as "400 Free")
    #[serde(default = "default_target_events")]
    pub target_events: Vec<String>,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 || self.workers > 64 {
            return Err("pipeline.workers must be between 1 and 64".to_string());
        }
        if self.max_depth == 0 || self.max_depth > 512 {
            return Err("pipeline.max_depth must be between 1 and 512".to_string());
        }
        if self.target_events.is_empty() {
            return Err("pipeline.target_events cannot be empty".to_string());
        }
        self.parsed_target_events()?;
        Ok(())
    }

    /// Target events parsed, de-duplicated and sorted by distance
    pub fn parsed_target_events(&self) -> Result<Vec<TargetEvent>, String> {
        let mut events = self
            .target_events
            .iter()
            .map(|label| TargetEvent::from_str(label))
            .collect::<Result<Vec<_>, _>>()?;
        events.sort();
        events.dedup();
        Ok(events)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            course_policy: CoursePolicy::default(),
            max_depth: default_max_depth(),
            target_events: default_target_events(),
        }
    }
}

/// Entity cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the durable (on-disk) layer
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one JSON file per athlete
    #[serde(default = "default_cache_directory")]
    pub directory: String,

    /// Time-to-live in seconds; omit to never expire
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl CacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.directory.is_empty() {
            return Err("cache.directory cannot be empty when cache is enabled".to_string());
        }
        Ok(())
    }

    /// TTL as a duration; `None` means entries never expire
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_directory(),
            ttl_seconds: None,
        }
    }
}

/// One open-water race to analyse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Upstream race (event) identifier
    pub race_id: String,

    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,

    /// Reference date override (YYYY-MM-DD); taken from the payload when absent
    #[serde(default)]
    pub reference_date: Option<String>,
}

impl RaceConfig {
    /// Pinned reference date, if configured and well-formed
    pub fn parsed_reference_date(&self) -> Option<chrono::NaiveDate> {
        self.reference_date
            .as_deref()
            .and_then(|date| chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
    }

    fn validate(&self) -> Result<(), String> {
        if self.race_id.trim().is_empty() {
            return Err("races.race_id cannot be empty".to_string());
        }
        if let Some(date) = &self.reference_date {
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                format!(
                    "races.reference_date '{date}' for race {} is not YYYY-MM-DD: {e}",
                    self.race_id
                )
            })?;
        }
        Ok(())
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON file receiving joined rows
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.is_empty() {
            return Err("output.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.worldaquatics.com/fina".to_string()
}

fn default_base_site() -> String {
    "https://www.worldaquatics.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_athlete_history_endpoints() -> Vec<String> {
    vec![
        "athletes/{athlete_id}/results".to_string(),
        "athletes/{athlete_id}/performances".to_string(),
    ]
}

fn default_athlete_profile_endpoints() -> Vec<String> {
    vec![
        "athletes/{athlete_id}".to_string(),
        "athlete/{athlete_id}".to_string(),
    ]
}

fn default_race_results_endpoints() -> Vec<String> {
    vec![
        "events/{race_id}".to_string(),
        "eventResults/{race_id}".to_string(),
    ]
}

fn default_workers() -> usize {
    8
}

fn default_max_depth() -> usize {
    64
}

fn default_target_events() -> Vec<String> {
    TargetEvent::ALL
        .iter()
        .map(|event| event.label().to_string())
        .collect()
}

fn default_cache_directory() -> String {
    "./cache/athletes".to_string()
}

fn default_output_path() -> String {
    "./output/ow_pool_bests.json".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
