//! Race assignments and athlete tasks
//!
//! A [`RaceAssignment`] is what the race-selection step hands to the pipeline:
//! one open-water race, its reference date and the athletes who raced it.
//! Each completed entry becomes one [`AthleteTask`].

use crate::domain::ids::{AthleteId, RaceId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result markers that mean the athlete did not complete the race
const NON_COMPLETION_MARKERS: [&str; 7] = ["DNF", "DNS", "DSQ", "DQ", "OTL", "RET", "WDR"];

/// One athlete's entry in an open-water race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEntry {
    pub athlete_id: AthleteId,
    pub display_name: String,
    #[serde(default)]
    pub nationality: Option<String>,
    /// Race time as reported upstream (passed through untouched)
    #[serde(default)]
    pub time: Option<String>,
    /// Finishing rank as reported upstream
    #[serde(default)]
    pub rank: Option<String>,
}

impl RaceEntry {
    /// Whether the entry carries a completion marker
    ///
    /// A rank or a result time counts, unless it is one of the
    /// did-not-finish/start/disqualified markers.
    pub fn is_completed(&self) -> bool {
        let marks_completion = |value: &Option<String>| {
            value.as_deref().map(str::trim).is_some_and(|v| {
                !v.is_empty()
                    && !NON_COMPLETION_MARKERS
                        .iter()
                        .any(|marker| v.eq_ignore_ascii_case(marker))
            })
        };
        let flagged = [&self.rank, &self.time].into_iter().any(|value| {
            value.as_deref().map(str::trim).is_some_and(|v| {
                NON_COMPLETION_MARKERS
                    .iter()
                    .any(|marker| v.eq_ignore_ascii_case(marker))
            })
        });
        !flagged && (marks_completion(&self.rank) || marks_completion(&self.time))
    }
}

/// An open-water race handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceAssignment {
    pub race_id: RaceId,
    pub race_name: Option<String>,
    /// Date of the race; `None` when it could not be determined
    pub reference_date: Option<NaiveDate>,
    pub entries: Vec<RaceEntry>,
}

/// Unit of work for a single athlete in a single race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthleteTask {
    pub race_id: RaceId,
    pub race_name: Option<String>,
    pub reference_date: NaiveDate,
    pub entry: RaceEntry,
}

impl AthleteTask {
    pub fn athlete_id(&self) -> &AthleteId {
        &self.entry.athlete_id
    }
}

/// Lifecycle of an athlete task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Fetching,
    Classifying,
    Aggregating,
    Done,
    Skipped,
}

impl TaskState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Pending, Skipped)
                | (Pending, Aggregating)
                | (Fetching, Classifying)
                | (Fetching, Done)
                | (Classifying, Aggregating)
                | (Classifying, Done)
                | (Aggregating, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Skipped)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Fetching => "fetching",
            TaskState::Classifying => "classifying",
            TaskState::Aggregating => "aggregating",
            TaskState::Done => "done",
            TaskState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}
