//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Swimbest configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// [`load_config`] already validates, so a load failure covers both
    /// unreadable and invalid files.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Upstream: {}", config.upstream.base_url);
        println!(
            "  Retries: {} attempt(s), {}ms initial delay",
            config.upstream.retry.max_retries, config.upstream.retry.initial_delay_ms
        );
        println!(
            "  Endpoint Templates: {} history, {} profile, {} race",
            config.upstream.endpoints.athlete_history.len(),
            config.upstream.endpoints.athlete_profile.len(),
            config.upstream.endpoints.race_results.len()
        );
        println!("  Workers: {}", config.pipeline.workers);
        println!("  Course Policy: {:?}", config.pipeline.course_policy);
        println!("  Target Events: {:?}", config.pipeline.target_events);
        if config.cache.enabled {
            println!("  Cache: {}", config.cache.directory);
            match config.cache.ttl_seconds {
                Some(ttl) => println!("  Cache TTL: {ttl}s"),
                None => println!("  Cache TTL: never expires"),
            }
        } else {
            println!("  Cache: in-memory only");
        }
        println!("  Output: {}", config.output.path);
        println!("  Races: {}", config.races.len());
        for race in &config.races {
            println!(
                "    - {} {}",
                race.race_id,
                race.reference_date
                    .as_deref()
                    .map(|date| format!("(pinned {date})"))
                    .unwrap_or_default()
            );
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_config_exits_zero() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\nbase_url = \"https://api.example.com\"\n\n[[races]]\nrace_id = \"4725\""
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_two() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\nbase_url = \"ftp://api.example.com\""
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
