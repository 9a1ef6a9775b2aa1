//! Per-athlete task execution
//!
//! ```text
//! Pending -> Fetching -> Classifying -> Aggregating -> Done
//! Pending -> Aggregating -> Done            (cache hit)
//! Pending -> Fetching -> Done               (fetch failed, no rows)
//! Pending -> Skipped                        (entry not completed)
//! ```

use super::summary::{TaskDisposition, TaskOutcome};
use crate::adapters::results::{FetchOutcome, PerformanceSource};
use crate::core::aggregate::aggregate;
use crate::core::cache::EntityCache;
use crate::core::classify::TreeScanner;
use crate::domain::{AthleteTask, CandidatePerformance, JoinedRow, TargetEvent, TaskState};
use std::sync::Arc;

/// Shared services every athlete task needs
pub struct AthleteWorker {
    source: Arc<dyn PerformanceSource>,
    cache: Arc<EntityCache>,
    scanner: TreeScanner,
    /// Cache tag for results classified by `scanner`
    scan_fingerprint: String,
}

impl AthleteWorker {
    pub fn new(
        source: Arc<dyn PerformanceSource>,
        cache: Arc<EntityCache>,
        scanner: TreeScanner,
    ) -> Self {
        let scan_fingerprint = scanner.options().fingerprint();
        Self {
            source,
            cache,
            scanner,
            scan_fingerprint,
        }
    }

    fn targets(&self) -> &[TargetEvent] {
        &self.scanner.options().targets
    }

    /// Run one task to a terminal state
    ///
    /// Never fails: fetch problems end the task with zero rows and a warning.
    pub async fn process(&self, task: AthleteTask) -> TaskOutcome {
        let athlete_id = task.athlete_id().clone();
        let mut state = TaskState::Pending;

        if !task.entry.is_completed() {
            advance(&mut state, TaskState::Skipped, &task);
            return TaskOutcome::skipped(athlete_id);
        }

        // held until the cache has been filled
        let _fill_guard = self.cache.fill_lock(&athlete_id).await;

        let (cached, hit) = self
            .cache
            .get(&athlete_id, &self.scan_fingerprint)
            .await;
        let (performances, disposition, candidates) = if hit {
            tracing::debug!(athlete_id = %athlete_id, performances = cached.len(), "Cache hit");
            (cached, TaskDisposition::Analysed, 0)
        } else {
            advance(&mut state, TaskState::Fetching, &task);
            match self.source.fetch_athlete(&athlete_id).await {
                Ok(FetchOutcome::Found { payload, endpoint }) => {
                    advance(&mut state, TaskState::Classifying, &task);
                    let performances = self.classify(&task, &payload, &endpoint);
                    self.store(&task, &performances).await;
                    let count = performances.len();
                    (performances, TaskDisposition::Analysed, count)
                }
                Ok(FetchOutcome::NotFound) => {
                    tracing::warn!(
                        athlete_id = %athlete_id,
                        source = self.source.name(),
                        "No performance data found for athlete"
                    );
                    advance(&mut state, TaskState::Classifying, &task);
                    (Vec::new(), TaskDisposition::NoData, 0)
                }
                Err(e) => {
                    tracing::warn!(
                        athlete_id = %athlete_id,
                        race_id = %task.race_id,
                        error = %e,
                        "Fetch failed, athlete contributes no rows"
                    );
                    advance(&mut state, TaskState::Done, &task);
                    return TaskOutcome::failed(athlete_id, e.to_string());
                }
            }
        };

        advance(&mut state, TaskState::Aggregating, &task);
        let rows = self.join(&task, &performances);
        advance(&mut state, TaskState::Done, &task);

        TaskOutcome {
            athlete_id,
            state,
            disposition,
            rows,
            cache_hit: hit,
            candidates,
        }
    }

    fn classify(
        &self,
        task: &AthleteTask,
        payload: &serde_json::Value,
        endpoint: &str,
    ) -> Vec<CandidatePerformance> {
        let report = self.scanner.scan(payload);
        tracing::debug!(
            athlete_id = %task.athlete_id(),
            endpoint = %endpoint,
            objects = report.objects_visited,
            candidates = report.candidates.len(),
            rejected_short_course = report.rejected.short_course,
            rejected_unknown_course = report.rejected.unknown_course,
            rejected_unclassified = report.rejected.unclassified_event,
            rejected_other = report.rejected.unparseable_time
                + report.rejected.missing_date
                + report.rejected.depth_limited,
            "Payload classified"
        );
        report.candidates
    }

    async fn store(&self, task: &AthleteTask, performances: &[CandidatePerformance]) {
        let stored = self
            .cache
            .put(task.athlete_id(), &self.scan_fingerprint, performances.to_vec())
            .await;
        if let Err(e) = stored {
            tracing::warn!(
                athlete_id = %task.athlete_id(),
                error = %e,
                "Failed to write cache entry"
            );
        }
    }

    fn join(&self, task: &AthleteTask, performances: &[CandidatePerformance]) -> Vec<JoinedRow> {
        aggregate(performances, task.reference_date, self.targets())
            .iter()
            .map(|(event, bests)| {
                JoinedRow::new(
                    task,
                    *event,
                    bests.personal_best.as_ref(),
                    bests.season_best.as_ref(),
                )
            })
            .collect()
    }
}

fn advance(state: &mut TaskState, next: TaskState, task: &AthleteTask) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal task transition {state} -> {next}"
    );
    tracing::trace!(
        athlete_id = %task.athlete_id(),
        from = %state,
        to = %next,
        "Task state transition"
    );
    *state = next;
}
