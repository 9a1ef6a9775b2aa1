//! Run summary and reporting
//!
//! Per-athlete [`TaskOutcome`]s fold into a per-race [`RaceReport`], and race
//! reports fold into a [`RunSummary`] for the whole run.

use crate::domain::{AthleteId, JoinedRow, RaceId, TaskState};
use std::time::Duration;

/// How an athlete task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDisposition {
    /// Bests computed from cached or freshly classified performances
    Analysed,
    /// Upstream had no data; rows carry absent bests
    NoData,
    /// Fetch failed after retries or the task aborted; no rows
    Failed(String),
    /// Entry carries no completion marker; no rows
    Skipped,
}

/// Result of one athlete task
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub athlete_id: AthleteId,
    /// Terminal state reached
    pub state: TaskState,
    pub disposition: TaskDisposition,
    pub rows: Vec<JoinedRow>,
    pub cache_hit: bool,
    /// Candidates retained by the scanner (0 on cache hits)
    pub candidates: usize,
}

impl TaskOutcome {
    pub fn skipped(athlete_id: AthleteId) -> Self {
        Self {
            athlete_id,
            state: TaskState::Skipped,
            disposition: TaskDisposition::Skipped,
            rows: Vec::new(),
            cache_hit: false,
            candidates: 0,
        }
    }

    pub fn failed(athlete_id: AthleteId, message: impl Into<String>) -> Self {
        Self {
            athlete_id,
            state: TaskState::Done,
            disposition: TaskDisposition::Failed(message.into()),
            rows: Vec::new(),
            cache_hit: false,
            candidates: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.disposition, TaskDisposition::Failed(_))
    }
}

/// Rows and counters for one race
#[derive(Debug, Clone)]
pub struct RaceReport {
    pub race_id: RaceId,
    pub rows: Vec<JoinedRow>,
    pub athletes_total: usize,
    pub analysed: usize,
    pub no_data: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Completed entries never submitted because of shutdown
    pub not_started: usize,
    pub cache_hits: usize,
    pub candidates: usize,
    pub duration: Duration,
}

impl RaceReport {
    pub fn new(race_id: RaceId, athletes_total: usize) -> Self {
        Self {
            race_id,
            rows: Vec::new(),
            athletes_total,
            analysed: 0,
            no_data: 0,
            failed: 0,
            skipped: 0,
            not_started: 0,
            cache_hits: 0,
            candidates: 0,
            duration: Duration::ZERO,
        }
    }

    /// Fold one task outcome in; order of calls does not matter
    pub fn record(&mut self, outcome: TaskOutcome) {
        match &outcome.disposition {
            TaskDisposition::Analysed => self.analysed += 1,
            TaskDisposition::NoData => self.no_data += 1,
            TaskDisposition::Failed(_) => self.failed += 1,
            TaskDisposition::Skipped => self.skipped += 1,
        }
        if outcome.cache_hit {
            self.cache_hits += 1;
        }
        self.candidates += outcome.candidates;
        self.rows.extend(outcome.rows);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// A race that could not be analysed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRace {
    pub race_id: RaceId,
    pub reason: String,
}

/// Summary of a multi-race run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub races_total: usize,
    pub races_analysed: usize,
    pub races_skipped: Vec<SkippedRace>,
    pub athletes_total: usize,
    pub athletes_analysed: usize,
    pub athletes_no_data: usize,
    pub athletes_failed: usize,
    pub athletes_skipped: usize,
    pub athletes_not_started: usize,
    pub cache_hits: usize,
    pub candidates: usize,
    pub rows: usize,
    pub duration: Duration,
    /// Shutdown was requested before all work was submitted
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_race(&mut self, report: &RaceReport) {
        self.races_analysed += 1;
        self.athletes_total += report.athletes_total;
        self.athletes_analysed += report.analysed;
        self.athletes_no_data += report.no_data;
        self.athletes_failed += report.failed;
        self.athletes_skipped += report.skipped;
        self.athletes_not_started += report.not_started;
        self.cache_hits += report.cache_hits;
        self.candidates += report.candidates;
        self.rows += report.rows.len();
    }

    pub fn skip_race(&mut self, race_id: RaceId, reason: impl Into<String>) {
        self.races_skipped.push(SkippedRace {
            race_id,
            reason: reason.into(),
        });
    }

    /// Every race analysed and every submitted athlete handled without a fetch failure
    pub fn is_clean(&self) -> bool {
        self.races_skipped.is_empty() && self.athletes_failed == 0 && !self.interrupted
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            races_total = self.races_total,
            races_analysed = self.races_analysed,
            races_skipped = self.races_skipped.len(),
            athletes_total = self.athletes_total,
            analysed = self.athletes_analysed,
            no_data = self.athletes_no_data,
            failed = self.athletes_failed,
            skipped = self.athletes_skipped,
            not_started = self.athletes_not_started,
            cache_hits = self.cache_hits,
            candidates = self.candidates,
            rows = self.rows,
            duration_secs = self.duration.as_secs(),
            interrupted = self.interrupted,
            "Run completed"
        );

        for skipped in &self.races_skipped {
            tracing::warn!(
                race_id = %skipped.race_id,
                reason = %skipped.reason,
                "Race skipped"
            );
        }
    }
}
