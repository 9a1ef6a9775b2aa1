//! Performance domain model
//!
//! Defines the target pool events, course lengths, classifier-extracted
//! candidate performances and the derived best-time records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target pool event tracked for every open-water athlete
///
/// Ordering follows distance, which is also the column order of output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetEvent {
    /// 400 m freestyle
    #[serde(rename = "400 Free")]
    Free400,
    /// 800 m freestyle
    #[serde(rename = "800 Free")]
    Free800,
    /// 1500 m freestyle
    #[serde(rename = "1500 Free")]
    Free1500,
}

impl TargetEvent {
    /// All target events in distance order
    pub const ALL: [TargetEvent; 3] = [
        TargetEvent::Free400,
        TargetEvent::Free800,
        TargetEvent::Free1500,
    ];

    /// Display label used in output rows and configuration
    pub fn label(&self) -> &'static str {
        match self {
            TargetEvent::Free400 => "400 Free",
            TargetEvent::Free800 => "800 Free",
            TargetEvent::Free1500 => "1500 Free",
        }
    }

    /// Distance token matched in free text
    pub fn distance_token(&self) -> &'static str {
        match self {
            TargetEvent::Free400 => "400",
            TargetEvent::Free800 => "800",
            TargetEvent::Free1500 => "1500",
        }
    }

    /// Distance in metres
    pub fn distance_m(&self) -> u32 {
        match self {
            TargetEvent::Free400 => 400,
            TargetEvent::Free800 => 800,
            TargetEvent::Free1500 => 1500,
        }
    }
}

impl fmt::Display for TargetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        TargetEvent::ALL
            .into_iter()
            .find(|event| event.label().to_lowercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown target event '{s}'. Must be one of: 400 Free, 800 Free, 1500 Free"
                )
            })
    }
}

/// Pool course length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Course {
    /// 50 m pool
    LongCourse,
    /// 25 m pool
    ShortCourse,
    /// No course marker found
    Unknown,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Course::LongCourse => "LCM",
            Course::ShortCourse => "SCM",
            Course::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One classified swim result extracted from an upstream payload
///
/// This is also the durable cache record, so field names are part of the
/// on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePerformance {
    /// Recognised target event
    pub event: TargetEvent,

    /// Course the performance was swum in
    pub course: Course,

    /// Elapsed time in seconds
    pub seconds: f64,

    /// Calendar date of the performance
    pub date: NaiveDate,

    /// Meet name, if the payload carried one
    #[serde(default)]
    pub meet_name: Option<String>,

    /// Three-letter meet country code
    #[serde(default)]
    pub meet_country: Option<String>,
}

impl CandidatePerformance {
    /// Structural validity of a (possibly deserialized) performance
    pub fn is_valid(&self) -> bool {
        self.seconds.is_finite() && self.seconds > 0.0
    }
}

/// Kind of derived best-time record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestKind {
    /// Fastest up to the reference date
    PersonalBest,
    /// Fastest within the reference date's calendar year
    SeasonBest,
}

/// Derived personal-best or season-best record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTimeRecord {
    pub kind: BestKind,
    pub event: TargetEvent,
    pub seconds: f64,
    pub date: NaiveDate,
    pub meet_name: Option<String>,
    pub meet_country: Option<String>,
}

impl BestTimeRecord {
    /// Build a record of the given kind from the winning candidate
    pub fn from_candidate(kind: BestKind, candidate: &CandidatePerformance) -> Self {
        Self {
            kind,
            event: candidate.event,
            seconds: candidate.seconds,
            date: candidate.date,
            meet_name: candidate.meet_name.clone(),
            meet_country: candidate.meet_country.clone(),
        }
    }

    /// Swim time rendered as `M:SS.ff`
    pub fn formatted_time(&self) -> String {
        format_seconds(self.seconds)
    }
}

/// Render elapsed seconds as `M:SS.ff`, or `SS.ff` below one minute
///
/// ```
/// use swimbest::domain::performance::format_seconds;
///
/// assert_eq!(format_seconds(228.0), "3:48.00");
/// assert_eq!(format_seconds(59.5), "59.50");
/// assert_eq!(format_seconds(912.34), "15:12.34");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    let hundredths = (seconds * 100.0).round() as u64;
    let minutes = hundredths / 6000;
    let rest = hundredths % 6000;
    let secs = rest / 100;
    let frac = rest % 100;
    if minutes == 0 {
        format!("{secs}.{frac:02}")
    } else {
        format!("{minutes}:{secs:02}.{frac:02}")
    }
}
