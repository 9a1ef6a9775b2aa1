// Swimbest - Pool best times for open-water race finishers
// Copyright (c) 2025 Swimbest Contributors
// Licensed under the MIT License

//! # Swimbest - pool bests for open-water finishers
//!
//! Swimbest takes the finishers of open-water races and, for each of them,
//! finds their long-course pool personal best and season best in the 400, 800
//! and 1500 metre freestyle.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** athlete performance histories from a results service, trying
//!   several endpoint layouts with retries
//! - **Scanning** arbitrarily shaped JSON payloads for long-course freestyle
//!   swims
//! - **Aggregating** personal and season bests relative to a race date
//! - **Caching** classified performances per athlete across runs
//! - **Orchestrating** many athletes concurrently, tolerating partial failure
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Classification, aggregation, caching and the athlete pipeline
//! - [`adapters`] - Results service client and output writer
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swimbest::adapters::results::{load_assignment, ResultsClient};
//! use swimbest::config::load_config;
//! use swimbest::core::cache::EntityCache;
//! use swimbest::core::pipeline::PipelineCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("swimbest.toml")?;
//!     let client = Arc::new(ResultsClient::new(&config.upstream)?);
//!     let cache = Arc::new(EntityCache::open(&config.cache).await?);
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let mut races = Vec::new();
//!     for race in &config.races {
//!         races.push(load_assignment(&client, race).await?);
//!     }
//!
//!     let coordinator = PipelineCoordinator::from_config(&config, client, cache, shutdown_rx)?;
//!     let report = coordinator.run_races(&races).await;
//!     println!("{} rows", report.rows.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Classification
//!
//! Classification is a pure function of the candidate text:
//!
//! ```rust
//! use swimbest::core::classify::{classify_course, classify_event};
//! use swimbest::domain::{Course, TargetEvent};
//!
//! assert_eq!(
//!     classify_event("Men 1500m Freestyle", &TargetEvent::ALL),
//!     Some(TargetEvent::Free1500)
//! );
//! assert_eq!(classify_course("400 Free (SCM)"), Course::ShortCourse);
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
