//! Analyze command implementation
//!
//! This module implements the `analyze` command: fetch each configured race,
//! run the athlete pipeline over its finishers and write the joined rows.

use crate::adapters::output::write_rows;
use crate::adapters::results::{load_assignment, PerformanceSource, ResultsClient};
use crate::config::{load_config, CoursePolicy, RaceConfig, SwimbestConfig};
use crate::core::cache::EntityCache;
use crate::core::pipeline::{PipelineCoordinator, RunSummary};
use crate::domain::{RaceAssignment, RaceId, SwimbestError};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the analyze command
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Override race ID(s) to analyse (comma-separated)
    #[arg(long)]
    pub race_id: Option<String>,

    /// Override the output file path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override the worker pool size
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Accept candidates without any course marker
    #[arg(long)]
    pub lenient: bool,

    /// Disable the durable cache for this run
    #[arg(long)]
    pub no_cache: bool,
}

impl AnalyzeArgs {
    /// Apply CLI overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut SwimbestConfig) {
        if let Some(race_ids) = &self.race_id {
            let races: Vec<RaceConfig> = race_ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| {
                    // keep pinned settings of races that are also configured
                    config
                        .races
                        .iter()
                        .find(|race| race.race_id == id)
                        .cloned()
                        .unwrap_or_else(|| RaceConfig {
                            race_id: id.to_string(),
                            name: None,
                            reference_date: None,
                        })
                })
                .collect();
            tracing::info!(races = races.len(), "Overriding races from CLI");
            config.races = races;
        }

        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding output path from CLI");
            config.output.path = output.clone();
        }

        if let Some(workers) = self.workers {
            tracing::info!(workers, "Overriding worker pool size from CLI");
            config.pipeline.workers = workers;
        }

        if self.lenient {
            tracing::info!("Enabling lenient course policy from CLI");
            config.pipeline.course_policy = CoursePolicy::Lenient;
        }

        if self.no_cache {
            tracing::info!("Disabling durable cache from CLI");
            config.cache.enabled = false;
        }
    }

    /// Execute the analyze command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting analyze command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(2);
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }
        if config.races.is_empty() {
            eprintln!("No races configured. Add [[races]] entries or pass --race-id");
            return Ok(2);
        }

        let client = match ResultsClient::new(&config.upstream) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create results client");
                eprintln!("Failed to initialize results client: {e}");
                return Ok(2);
            }
        };
        let cache = match EntityCache::open(&config.cache).await {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Failed to open entity cache");
                eprintln!("Failed to open cache: {e}");
                return Ok(5);
            }
        };

        let source: Arc<dyn PerformanceSource> = client.clone();
        let coordinator =
            PipelineCoordinator::from_config(&config, source, cache.clone(), shutdown_signal.clone())?;

        println!("🏊 Loading {} race(s)...", config.races.len());
        let loaded = load_races(&client, &config.races, &shutdown_signal).await;

        if loaded.assignments.is_empty() && loaded.unreachable > 0 && !loaded.interrupted {
            eprintln!("Results service unreachable for every configured race");
            return Ok(4);
        }

        println!("🚀 Analysing {} race(s)...", loaded.assignments.len());
        let report = coordinator.run_races(&loaded.assignments).await;

        let mut summary = report.summary;
        summary.races_total += loaded.failed.len();
        for (race_id, reason) in loaded.failed {
            summary.skip_race(race_id, reason);
        }
        summary.interrupted |= loaded.interrupted;

        if let Err(e) = write_rows(&config.output.path, &report.rows) {
            tracing::error!(error = %e, "Failed to write output");
            eprintln!("Failed to write output: {e}");
            return Ok(5);
        }

        summary.log_summary();
        let stats = cache.stats();
        tracing::info!(
            memory_hits = stats.memory_hits,
            disk_hits = stats.disk_hits,
            misses = stats.misses,
            writes = stats.writes,
            "Cache statistics"
        );
        print_summary(&summary, &config.output.path);

        let exit_code = if summary.interrupted {
            println!("⚠️  Analysis interrupted. Completed athletes are cached for the next run.");
            tracing::info!("Analysis interrupted by user signal");
            130
        } else if summary.is_clean() {
            println!("✅ Analysis completed successfully!");
            0
        } else {
            println!("⚠️  Analysis completed with skipped races or failed athletes");
            0
        };

        Ok(exit_code)
    }
}

/// Races fetched from upstream, with the ones that could not be loaded
struct LoadedRaces {
    assignments: Vec<RaceAssignment>,
    failed: Vec<(RaceId, String)>,
    unreachable: usize,
    interrupted: bool,
}

async fn load_races(
    client: &ResultsClient,
    races: &[RaceConfig],
    shutdown: &watch::Receiver<bool>,
) -> LoadedRaces {
    let mut loaded = LoadedRaces {
        assignments: Vec::with_capacity(races.len()),
        failed: Vec::new(),
        unreachable: 0,
        interrupted: false,
    };

    for race in races {
        if *shutdown.borrow() {
            loaded.interrupted = true;
            break;
        }

        match load_assignment(client, race).await {
            Ok(assignment) => loaded.assignments.push(assignment),
            Err(e) => {
                crate::log_error_with_context!(&e, "Race results could not be loaded");
                if matches!(e, SwimbestError::Fetch(_)) {
                    loaded.unreachable += 1;
                }
                if let Ok(race_id) = RaceId::new(race.race_id.as_str()) {
                    loaded.failed.push((race_id, e.to_string()));
                }
            }
        }
    }
    loaded
}

fn print_summary(summary: &RunSummary, output_path: &str) {
    println!();
    println!("📊 Analysis Summary:");
    println!(
        "  Races: {} analysed, {} skipped of {}",
        summary.races_analysed,
        summary.races_skipped.len(),
        summary.races_total
    );
    println!("  Athletes: {}", summary.athletes_total);
    println!("    With data: {}", summary.athletes_analysed);
    println!("    No data upstream: {}", summary.athletes_no_data);
    println!("    Failed: {}", summary.athletes_failed);
    println!("    Not finished: {}", summary.athletes_skipped);
    if summary.athletes_not_started > 0 {
        println!("    Not started: {}", summary.athletes_not_started);
    }
    println!("  Cache hits: {}", summary.cache_hits);
    println!("  Rows written: {} -> {}", summary.rows, output_path);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

    if !summary.races_skipped.is_empty() {
        println!();
        println!("⚠️  Skipped races:");
        for skipped in &summary.races_skipped {
            println!("  - {}: {}", skipped.race_id, skipped.reason);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_races() -> SwimbestConfig {
        let toml = r#"
[upstream]
base_url = "https://api.example.com"

[[races]]
race_id = "4725"
reference_date = "2025-07-17"
"#;
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_analyze_args_defaults() {
        let args = AnalyzeArgs::default();
        assert!(args.race_id.is_none());
        assert!(args.output.is_none());
        assert!(!args.lenient);
        assert!(!args.no_cache);
    }

    #[test]
    fn test_race_override_keeps_pinned_dates() {
        let mut config = config_with_races();
        let args = AnalyzeArgs {
            race_id: Some("4725, 4726,".to_string()),
            ..Default::default()
        };
        args.apply_overrides(&mut config);

        assert_eq!(config.races.len(), 2);
        assert_eq!(config.races[0].reference_date.as_deref(), Some("2025-07-17"));
        assert_eq!(config.races[1].race_id, "4726");
        assert!(config.races[1].reference_date.is_none());
    }

    #[test]
    fn test_flag_overrides() {
        let mut config = config_with_races();
        let args = AnalyzeArgs {
            output: Some("out/rows.json".to_string()),
            workers: Some(3),
            lenient: true,
            no_cache: true,
            ..Default::default()
        };
        args.apply_overrides(&mut config);

        assert_eq!(config.output.path, "out/rows.json");
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.pipeline.course_policy, CoursePolicy::Lenient);
        assert!(!config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_config_exits_with_configuration_error() {
        let (_tx, rx) = watch::channel(false);
        let code = AnalyzeArgs::default()
            .execute("/nonexistent/swimbest.toml", rx)
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
