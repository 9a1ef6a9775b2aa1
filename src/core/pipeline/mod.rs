//! Athlete pipeline orchestration
//!
//! - [`coordinator`] - bounded worker pool over the athletes of each race
//! - [`worker`] - the per-athlete state machine (cache, fetch, classify, aggregate)
//! - [`summary`] - per-task, per-race and per-run reporting

pub mod coordinator;
pub mod summary;
pub mod worker;

pub use coordinator::{PipelineCoordinator, RunReport};
pub use summary::{RaceReport, RunSummary, SkippedRace, TaskDisposition, TaskOutcome};
pub use worker::AthleteWorker;
