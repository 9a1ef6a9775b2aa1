//! Personal-best and season-best reduction
//!
//! [`aggregate`] is a pure function over a candidate list and a reference
//! date. For every target event:
//!
//! - the personal best is the fastest candidate dated on or before the
//!   reference date
//! - the season best is the fastest candidate of that subset dated in the
//!   reference date's calendar year
//!
//! Equal times resolve to the earliest date, then to the candidate that
//! appears first in the input. Either record is absent when its subset is
//! empty.

use crate::domain::{BestKind, BestTimeRecord, CandidatePerformance, TargetEvent};
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Bests for one target event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBests {
    pub personal_best: Option<BestTimeRecord>,
    pub season_best: Option<BestTimeRecord>,
}

impl EventBests {
    pub fn is_empty(&self) -> bool {
        self.personal_best.is_none() && self.season_best.is_none()
    }
}

/// Reduce `candidates` to per-event bests as of `reference_date`
///
/// The returned map holds an entry for every event in `targets`, including
/// events without any qualifying candidate.
///
/// ```
/// use chrono::NaiveDate;
/// use swimbest::core::aggregate::aggregate;
/// use swimbest::domain::{CandidatePerformance, Course, TargetEvent};
///
/// let swim = |seconds: f64, date: &str| CandidatePerformance {
///     event: TargetEvent::Free400,
///     course: Course::LongCourse,
///     seconds,
///     date: date.parse().unwrap(),
///     meet_name: None,
///     meet_country: None,
/// };
/// let reference = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
/// let bests = aggregate(&[swim(225.0, "2024-07-01"), swim(230.0, "2025-03-01")], reference, &TargetEvent::ALL);
///
/// let free400 = &bests[&TargetEvent::Free400];
/// assert_eq!(free400.personal_best.as_ref().unwrap().seconds, 225.0);
/// assert_eq!(free400.season_best.as_ref().unwrap().seconds, 230.0);
/// assert!(bests[&TargetEvent::Free800].is_empty());
/// ```
pub fn aggregate(
    candidates: &[CandidatePerformance],
    reference_date: NaiveDate,
    targets: &[TargetEvent],
) -> BTreeMap<TargetEvent, EventBests> {
    targets
        .iter()
        .map(|&event| {
            let eligible: Vec<&CandidatePerformance> = candidates
                .iter()
                .filter(|c| c.event == event && c.is_valid() && c.date <= reference_date)
                .collect();

            let personal_best = fastest(eligible.iter().copied())
                .map(|c| BestTimeRecord::from_candidate(BestKind::PersonalBest, c));
            let season_best = fastest(
                eligible
                    .iter()
                    .copied()
                    .filter(|c| c.date.year() == reference_date.year()),
            )
            .map(|c| BestTimeRecord::from_candidate(BestKind::SeasonBest, c));

            (
                event,
                EventBests {
                    personal_best,
                    season_best,
                },
            )
        })
        .collect()
}

/// Minimum by time, then date; the first of fully equal candidates wins
fn fastest<'a>(
    candidates: impl Iterator<Item = &'a CandidatePerformance>,
) -> Option<&'a CandidatePerformance> {
    candidates.fold(None, |best, candidate| match best {
        Some(current) if !beats(candidate, current) => Some(current),
        _ => Some(candidate),
    })
}

fn beats(challenger: &CandidatePerformance, current: &CandidatePerformance) -> bool {
    let by_time = challenger
        .seconds
        .partial_cmp(&current.seconds)
        .unwrap_or(Ordering::Equal);
    by_time.then(challenger.date.cmp(&current.date)) == Ordering::Less
}
