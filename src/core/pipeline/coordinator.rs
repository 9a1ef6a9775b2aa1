//! Pipeline coordinator - drives athlete tasks for one or more races
//!
//! Tasks for a race run on spawned tokio tasks, at most `workers` at a time.
//! A task that panics is contained: it is logged and contributes no rows.
//! Once the shutdown signal is set no further tasks are submitted, while
//! tasks already in flight run to completion.

use super::summary::{RaceReport, RunSummary, TaskOutcome};
use super::worker::AthleteWorker;
use crate::adapters::results::PerformanceSource;
use crate::config::SwimbestConfig;
use crate::core::cache::EntityCache;
use crate::core::classify::{ScanOptions, TreeScanner};
use crate::domain::{
    AthleteTask, JoinedRow, PipelineError, RaceAssignment, Result, SwimbestError,
};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Rows and summary of a multi-race run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rows: Vec<JoinedRow>,
    pub summary: RunSummary,
}

/// Pipeline coordinator
pub struct PipelineCoordinator {
    worker: Arc<AthleteWorker>,
    workers: usize,
    shutdown: watch::Receiver<bool>,
}

impl PipelineCoordinator {
    /// Create a coordinator over explicit services
    pub fn new(
        source: Arc<dyn PerformanceSource>,
        cache: Arc<EntityCache>,
        options: ScanOptions,
        workers: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let worker = AthleteWorker::new(source, cache, TreeScanner::new(options));
        Self {
            worker: Arc::new(worker),
            workers: workers.max(1),
            shutdown,
        }
    }

    /// Create a coordinator using the `[pipeline]` settings of `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the target events do not parse.
    pub fn from_config(
        config: &SwimbestConfig,
        source: Arc<dyn PerformanceSource>,
        cache: Arc<EntityCache>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let options = ScanOptions::from_config(&config.pipeline)?;
        Ok(Self::new(
            source,
            cache,
            options,
            config.pipeline.workers,
            shutdown,
        ))
    }

    fn is_shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Analyse one race
    ///
    /// Athlete-level failures never fail the race; they show up as missing
    /// rows and in the report counters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingReferenceDate`] if the race has no
    /// reference date.
    pub async fn run_race(
        &self,
        race: &RaceAssignment,
    ) -> std::result::Result<RaceReport, PipelineError> {
        let start_time = Instant::now();
        let reference_date =
            race.reference_date
                .ok_or_else(|| PipelineError::MissingReferenceDate {
                    race_id: race.race_id.to_string(),
                })?;

        crate::log_race_start!(&race.race_id, race.entries.len());

        let tasks: Vec<AthleteTask> = race
            .entries
            .iter()
            .map(|entry| AthleteTask {
                race_id: race.race_id.clone(),
                race_name: race.race_name.clone(),
                reference_date,
                entry: entry.clone(),
            })
            .collect();

        let mut report = RaceReport::new(race.race_id.clone(), tasks.len());
        let submitted = Arc::new(AtomicUsize::new(0));
        let shutdown = self.shutdown.clone();

        let outcomes: Vec<TaskOutcome> = stream::iter(tasks)
            .take_while(move |_| futures::future::ready(!*shutdown.borrow()))
            .map(|task| {
                let worker = Arc::clone(&self.worker);
                let submitted = Arc::clone(&submitted);
                async move {
                    submitted.fetch_add(1, Ordering::Relaxed);
                    let athlete_id = task.athlete_id().clone();
                    match tokio::spawn(async move { worker.process(task).await }).await {
                        Ok(outcome) => outcome,
                        Err(join_error) => {
                            let error = PipelineError::TaskAborted {
                                athlete_id: athlete_id.to_string(),
                                message: join_error.to_string(),
                            };
                            tracing::error!(
                                athlete_id = %athlete_id,
                                error = %error,
                                "Athlete task aborted"
                            );
                            TaskOutcome::failed(athlete_id, error.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        for outcome in outcomes {
            report.record(outcome);
        }
        report.not_started = report.athletes_total - submitted.load(Ordering::Relaxed);
        if report.not_started > 0 {
            tracing::warn!(
                race_id = %race.race_id,
                not_started = report.not_started,
                "Shutdown requested, remaining athletes not submitted"
            );
        }

        let report = report.with_duration(start_time.elapsed());
        crate::log_race_complete!(&race.race_id, report.rows.len(), report.duration);
        Ok(report)
    }

    /// Analyse races one after another
    ///
    /// Races without a reference date are logged, recorded as skipped and do
    /// not stop the run.
    pub async fn run_races(&self, races: &[RaceAssignment]) -> RunReport {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();
        summary.races_total = races.len();
        let mut rows = Vec::new();

        for race in races {
            if self.is_shutdown_requested() {
                summary.interrupted = true;
                tracing::warn!(race_id = %race.race_id, "Shutdown requested, race not started");
                break;
            }

            match self.run_race(race).await {
                Ok(report) => {
                    summary.add_race(&report);
                    rows.extend(report.rows);
                }
                Err(e) => {
                    crate::log_error_with_context!(
                        SwimbestError::from(e),
                        "Race cannot be analysed, skipping"
                    );
                    summary.skip_race(
                        race.race_id.clone(),
                        "no determinable reference date",
                    );
                }
            }
        }

        if summary.athletes_not_started > 0 {
            summary.interrupted = true;
        }

        let summary = summary.with_duration(start_time.elapsed());
        RunReport { rows, summary }
    }
}
