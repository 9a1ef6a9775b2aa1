//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{CoursePolicy, SwimbestConfig};
use crate::domain::errors::SwimbestError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SwimbestConfig
/// 4. Applies environment variable overrides (SWIMBEST_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is missing, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use swimbest::config::loader::load_config;
///
/// let config = load_config("swimbest.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SwimbestConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SwimbestError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SwimbestError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: SwimbestConfig = toml::from_str(&contents)
        .map_err(|e| SwimbestError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SwimbestError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SwimbestError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using SWIMBEST_* prefix
///
/// Environment variables follow the pattern: SWIMBEST_<SECTION>_<KEY>
/// For example: SWIMBEST_UPSTREAM_BASE_URL, SWIMBEST_PIPELINE_WORKERS
fn apply_env_overrides(config: &mut SwimbestConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("SWIMBEST_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Upstream overrides
    if let Ok(val) = std::env::var("SWIMBEST_UPSTREAM_BASE_URL") {
        config.upstream.base_url = val;
    }
    if let Ok(val) = std::env::var("SWIMBEST_UPSTREAM_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.upstream.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("SWIMBEST_UPSTREAM_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.upstream.retry.max_retries = retries;
        }
    }
    if let Ok(val) = std::env::var("SWIMBEST_UPSTREAM_RETRY_INITIAL_DELAY_MS") {
        if let Ok(delay) = val.parse() {
            config.upstream.retry.initial_delay_ms = delay;
        }
    }

    // Pipeline overrides
    if let Ok(val) = std::env::var("SWIMBEST_PIPELINE_WORKERS") {
        if let Ok(workers) = val.parse() {
            config.pipeline.workers = workers;
        }
    }
    if let Ok(val) = std::env::var("SWIMBEST_PIPELINE_COURSE_POLICY") {
        config.pipeline.course_policy = match val.to_lowercase().as_str() {
            "strict" => CoursePolicy::Strict,
            "lenient" => CoursePolicy::Lenient,
            other => {
                return Err(SwimbestError::Configuration(format!(
                    "Invalid SWIMBEST_PIPELINE_COURSE_POLICY '{other}'. Must be strict or lenient"
                )))
            }
        };
    }

    // Cache overrides
    if let Ok(val) = std::env::var("SWIMBEST_CACHE_ENABLED") {
        config.cache.enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SWIMBEST_CACHE_DIRECTORY") {
        config.cache.directory = val;
    }
    if let Ok(val) = std::env::var("SWIMBEST_CACHE_TTL_SECONDS") {
        // "never" (or empty) disables expiry
        config.cache.ttl_seconds = match val.trim() {
            "" | "never" => None,
            other => Some(other.parse().map_err(|e| {
                SwimbestError::Configuration(format!(
                    "Invalid SWIMBEST_CACHE_TTL_SECONDS '{other}': {e}"
                ))
            })?),
        };
    }

    // Output overrides
    if let Ok(val) = std::env::var("SWIMBEST_OUTPUT_PATH") {
        config.output.path = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SWIMBEST_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SWIMBEST_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
