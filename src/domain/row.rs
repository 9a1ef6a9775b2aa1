//! Joined output rows
//!
//! One row per athlete per target pool event, combining the race identity,
//! the pass-through race result and the computed pool bests.

use crate::domain::performance::{BestTimeRecord, TargetEvent};
use crate::domain::task::AthleteTask;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Flattened best-time fields as written to output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMark {
    /// Time rendered as `M:SS.ff`
    pub time: String,
    pub seconds: f64,
    pub date: NaiveDate,
    pub meet: Option<String>,
    pub country: Option<String>,
}

impl From<&BestTimeRecord> for BestMark {
    fn from(record: &BestTimeRecord) -> Self {
        Self {
            time: record.formatted_time(),
            seconds: record.seconds,
            date: record.date,
            meet: record.meet_name.clone(),
            country: record.meet_country.clone(),
        }
    }
}

/// Output row joining race, athlete and pool bests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub race_id: String,
    pub race_name: Option<String>,
    pub reference_date: NaiveDate,
    pub athlete_id: String,
    pub display_name: String,
    pub nationality: Option<String>,
    pub race_time: Option<String>,
    pub race_rank: Option<String>,
    pub pool_event: TargetEvent,
    pub personal_best: Option<BestMark>,
    pub season_best: Option<BestMark>,
}

impl JoinedRow {
    /// Build a row for one target event of a task
    pub fn new(
        task: &AthleteTask,
        pool_event: TargetEvent,
        personal_best: Option<&BestTimeRecord>,
        season_best: Option<&BestTimeRecord>,
    ) -> Self {
        Self {
            race_id: task.race_id.to_string(),
            race_name: task.race_name.clone(),
            reference_date: task.reference_date,
            athlete_id: task.entry.athlete_id.to_string(),
            display_name: task.entry.display_name.clone(),
            nationality: task.entry.nationality.clone(),
            race_time: task.entry.time.clone(),
            race_rank: task.entry.rank.clone(),
            pool_event,
            personal_best: personal_best.map(BestMark::from),
            season_best: season_best.map(BestMark::from),
        }
    }
}
