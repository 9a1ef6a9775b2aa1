//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "swimbest.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Swimbest configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Add the open-water races to analyse as [[races]] entries");
                println!("  2. Point [upstream] base_url at your results service");
                println!("  3. Validate configuration: swimbest validate-config");
                println!("  4. Run the analysis: swimbest analyze");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# Swimbest Configuration File
# Pool best times for open-water race finishers

[application]
log_level = "info"

[upstream]
base_url = "https://api.worldaquatics.com/fina"
timeout_seconds = 30

[pipeline]
workers = 8
course_policy = "strict"
target_events = ["400 Free", "800 Free", "1500 Free"]

[cache]
enabled = true
directory = "./cache/athletes"

[output]
path = "./output/ow_pool_bests.json"

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"

[[races]]
race_id = "4725"
# reference_date = "2025-07-17"
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# Swimbest Configuration File
# Pool best times for open-water race finishers
#
# Values of the form ${VAR_NAME} are replaced from the environment, and every
# setting can be overridden with SWIMBEST_<SECTION>_<KEY> variables.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Upstream Results Service
# ============================================================================
[upstream]
# Base URL; relative endpoint templates are joined onto it
base_url = "https://api.worldaquatics.com/fina"

# Per-request timeout in seconds
timeout_seconds = 30

# Headers sent with every request
user_agent = "Mozilla/5.0"
origin = "https://www.worldaquatics.com"
referer = "https://www.worldaquatics.com"

[upstream.retry]
# Attempts per endpoint for transport errors, 429 and 5xx responses
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 8000
backoff_multiplier = 2.0

# Endpoint templates are tried in order; the first usable JSON answer wins
[upstream.endpoints]
athlete_history = [
    "athletes/{athlete_id}/results",
    "athletes/{athlete_id}/performances",
]
athlete_profile = [
    "athletes/{athlete_id}",
    "athlete/{athlete_id}",
]
race_results = [
    "events/{race_id}",
    "eventResults/{race_id}",
]

# ============================================================================
# Athlete Pipeline
# ============================================================================
[pipeline]
# Concurrent athlete tasks (1-64)
workers = 8

# strict: results without any course marker are ignored
# lenient: such results count as long course
course_policy = "strict"

# Maximum JSON nesting depth scanned in athlete payloads
max_depth = 64

# Pool events to report
target_events = ["400 Free", "800 Free", "1500 Free"]

# ============================================================================
# Entity Cache
# ============================================================================
[cache]
enabled = true
directory = "./cache/athletes"

# Entries older than this are refetched; omit to keep entries forever
# ttl_seconds = 604800

# ============================================================================
# Output
# ============================================================================
[output]
path = "./output/ow_pool_bests.json"

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = true
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"

# ============================================================================
# Races
# ============================================================================
# One entry per open-water race. The reference date is read from the race
# payload unless pinned here.
[[races]]
race_id = "4725"
name = "Women 10km"
reference_date = "2025-07-17"

[[races]]
race_id = "4726"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwimbestConfig;
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "swimbest.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "swimbest.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse_and_validate() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: SwimbestConfig = toml::from_str(&content).unwrap();
            config.validate().unwrap();
            assert!(!config.races.is_empty());
        }
    }

    #[tokio::test]
    async fn test_existing_file_requires_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("swimbest.toml");
        fs::write(&path, "# keep me").unwrap();

        let mut args = InitArgs {
            output: path.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# keep me");

        args.force = true;
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().contains("[upstream]"));
    }
}
