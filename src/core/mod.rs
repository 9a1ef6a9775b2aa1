//! Core business logic for Swimbest.
//!
//! # Modules
//!
//! - [`classify`] - Recover candidate performances from payloads of unknown shape
//! - [`aggregate`] - Reduce candidates to personal and season bests
//! - [`cache`] - Two-layer athlete cache (memory + durable JSON files)
//! - [`pipeline`] - Bounded-concurrency orchestration over race athletes
//!
//! # Workflow
//!
//! For each race:
//!
//! 1. **Expand**: One task per athlete entry; non-finishers are skipped
//! 2. **Lookup**: Serve the athlete from cache when fresh
//! 3. **Fetch**: Otherwise try the configured endpoints in order
//! 4. **Classify**: Scan the payload for long-course target-event swims
//! 5. **Aggregate**: Personal and season best per target event
//! 6. **Join**: One row per athlete per target event
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swimbest::adapters::results::ResultsClient;
//! use swimbest::config::load_config;
//! use swimbest::core::cache::EntityCache;
//! use swimbest::core::pipeline::PipelineCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("swimbest.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let source = Arc::new(ResultsClient::new(&config.upstream)?);
//! let cache = Arc::new(EntityCache::open(&config.cache).await?);
//! let coordinator = PipelineCoordinator::from_config(&config, source, cache, shutdown_rx)?;
//!
//! let run = coordinator.run_races(&[]).await;
//! println!("Rows: {}", run.rows.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod pipeline;
