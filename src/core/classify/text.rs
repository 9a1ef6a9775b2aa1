//! Pure text classification
//!
//! Maps assembled free text to a `(TargetEvent, Course)` pair and parses the
//! loosely formatted times and dates found in upstream payloads. Nothing here
//! touches JSON structure; see [`super::scanner`] for that.
//!
//! # Course precedence
//!
//! Course detection is reject-dominant: if a short-course marker appears
//! anywhere in the text the result is [`Course::ShortCourse`], whatever
//! long-course markers are also present and in whatever order they appear.
//! Only text with no short-course marker and at least one long-course marker
//! is [`Course::LongCourse`].

use crate::domain::{Course, TargetEvent};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Markers for 25 m (and yard) pools
const SHORT_COURSE_TOKENS: [&str; 13] = [
    "25m",
    "25 m",
    "25-m",
    "25 metre",
    "25 meter",
    "(25)",
    "scm",
    "scy",
    "sc",
    "short course",
    "short-course",
    "vasca corta",
    "petit bassin",
];

/// Markers for 50 m pools
const LONG_COURSE_TOKENS: [&str; 12] = [
    "50m",
    "50 m",
    "50-m",
    "50 metre",
    "50 meter",
    "(50)",
    "lcm",
    "lc",
    "long course",
    "long-course",
    "vasca lunga",
    "grand bassin",
];

/// Freestyle markers; matched on word boundaries
const FREESTYLE_TOKENS: [&str; 7] = [
    "freestyle",
    "free",
    "fr",
    "crawl",
    "freistil",
    "libero",
    "libre",
];

fn relay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"relay|staffetta|\b\d\s*x\s*\d").expect("relay pattern is a valid regex")
    })
}

fn clock_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,3}):([0-5]\d)(?:[.,](\d{1,3}))?$")
            .expect("clock time pattern is a valid regex")
    })
}

fn bare_seconds_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)(?:[.,](\d+))?$").expect("bare seconds pattern is a valid regex")
    })
}

/// Classify assembled text into a target event and a course
///
/// `targets` is the ordered list of events to look for; the first one whose
/// distance token matches wins.
///
/// ```
/// use swimbest::core::classify::classify_text;
/// use swimbest::domain::{Course, TargetEvent};
///
/// let (event, course) = classify_text("Men 1500m Freestyle LCM", &TargetEvent::ALL);
/// assert_eq!(event, Some(TargetEvent::Free1500));
/// assert_eq!(course, Course::LongCourse);
/// ```
pub fn classify_text(text: &str, targets: &[TargetEvent]) -> (Option<TargetEvent>, Course) {
    let lowered = text.to_lowercase();
    (
        classify_event_lowered(&lowered, targets),
        classify_course_lowered(&lowered),
    )
}

/// Recognise a target freestyle event in a label
pub fn classify_event(text: &str, targets: &[TargetEvent]) -> Option<TargetEvent> {
    classify_event_lowered(&text.to_lowercase(), targets)
}

/// Detect the course of a text; short-course markers always win
pub fn classify_course(text: &str) -> Course {
    classify_course_lowered(&text.to_lowercase())
}

fn classify_event_lowered(text: &str, targets: &[TargetEvent]) -> Option<TargetEvent> {
    if relay_pattern().is_match(text) {
        return None;
    }
    if !FREESTYLE_TOKENS.iter().any(|token| contains_word(text, token)) {
        return None;
    }
    targets
        .iter()
        .copied()
        .find(|event| contains_distance(text, event.distance_token()))
}

fn classify_course_lowered(text: &str) -> Course {
    if SHORT_COURSE_TOKENS.iter().any(|token| contains_word(text, token)) {
        return Course::ShortCourse;
    }
    if LONG_COURSE_TOKENS.iter().any(|token| contains_word(text, token)) {
        return Course::LongCourse;
    }
    Course::Unknown
}

/// `token` occurs in `text` with no alphanumeric neighbour on either side
fn contains_word(text: &str, token: &str) -> bool {
    text.match_indices(token).any(|(idx, matched)| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Distance token not glued to other digits or to a preceding letter
///
/// `400m`, `400 free` and `400-free` match; `4000`, `1400` and `4x400` do not.
fn contains_distance(text: &str, token: &str) -> bool {
    text.match_indices(token).any(|(idx, matched)| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Parse a swim time from a JSON value
///
/// Accepts `MM:SS.ff` strings (fraction optional, `,` allowed as decimal
/// separator), bare-seconds strings, and JSON numbers. Returns `None` for
/// anything else or for non-positive values.
///
/// ```
/// use swimbest::core::classify::parse_time;
/// use serde_json::json;
///
/// assert_eq!(parse_time(&json!("3:48.00")), Some(228.0));
/// assert_eq!(parse_time(&json!(228.5)), Some(228.5));
/// assert_eq!(parse_time(&json!("DNF")), None);
/// ```
pub fn parse_time(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_time_str(s)?,
        _ => return None,
    };
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

fn parse_time_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Some(caps) = clock_time_pattern().captures(s) {
        let minutes: f64 = caps[1].parse().ok()?;
        let secs: f64 = caps[2].parse().ok()?;
        let fraction = caps
            .get(3)
            .map(|m| fraction_value(m.as_str()))
            .unwrap_or(Some(0.0))?;
        return Some(minutes * 60.0 + secs + fraction);
    }
    if let Some(caps) = bare_seconds_pattern().captures(s) {
        let whole: f64 = caps[1].parse().ok()?;
        let fraction = caps
            .get(2)
            .map(|m| fraction_value(m.as_str()))
            .unwrap_or(Some(0.0))?;
        return Some(whole + fraction);
    }
    None
}

fn fraction_value(digits: &str) -> Option<f64> {
    format!("0.{digits}").parse().ok()
}

/// Parse a calendar date from a JSON value
///
/// Strings may be ISO dates, the date prefix of an ISO datetime,
/// `DD/MM/YYYY`, `DD.MM.YYYY`, `YYYYMMDD` or `DD Mon YYYY`. Integers are read
/// as `YYYYMMDD`.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| NaiveDate::parse_from_str(&v.to_string(), "%Y%m%d").ok()),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Some(prefix) = s.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    ["%d/%m/%Y", "%d.%m.%Y", "%Y%m%d", "%d %b %Y", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("Men 400m Freestyle", Some(TargetEvent::Free400) ; "world aquatics discipline name")]
    #[test_case("800 Free", Some(TargetEvent::Free800) ; "short label")]
    #[test_case("1500m freestyle (LCM)", Some(TargetEvent::Free1500) ; "with course suffix")]
    #[test_case("400 FR", Some(TargetEvent::Free400) ; "abbreviated stroke")]
    #[test_case("400m Individual Medley", None ; "other stroke")]
    #[test_case("200m Freestyle", None ; "untracked distance")]
    #[test_case("4x400m Freestyle Relay", None ; "relay")]
    #[test_case("4000m freestyle", None ; "distance glued to digits")]
    #[test_case("Open Water 10km", None ; "open water")]
    fn test_classify_event(label: &str, expected: Option<TargetEvent>) {
        assert_eq!(classify_event(label, &TargetEvent::ALL), expected);
    }

    #[test]
    fn test_first_matching_distance_wins() {
        let label = "400 free then 800 free";
        assert_eq!(classify_event(label, &TargetEvent::ALL), Some(TargetEvent::Free400));
        let reversed = [TargetEvent::Free800, TargetEvent::Free400];
        assert_eq!(classify_event(label, &reversed), Some(TargetEvent::Free800));
    }

    #[test]
    fn test_distance_tokens_do_not_overlap() {
        assert_eq!(
            classify_event("1500m Freestyle", &TargetEvent::ALL),
            Some(TargetEvent::Free1500)
        );
        assert_eq!(classify_event("1400 free", &TargetEvent::ALL), None);
    }

    #[test_case("Freestyle 400m LCM", Course::LongCourse ; "lcm marker")]
    #[test_case("Long Course Nationals", Course::LongCourse ; "long course words")]
    #[test_case("400m Freestyle (50)", Course::LongCourse ; "parenthesised pool length")]
    #[test_case("400m Freestyle SCM", Course::ShortCourse ; "scm marker")]
    #[test_case("400 Free SC", Course::ShortCourse ; "sc abbreviation")]
    #[test_case("400 Free LC", Course::LongCourse ; "lc abbreviation")]
    #[test_case("Disc 400 free", Course::Unknown ; "abbreviation inside a word")]
    #[test_case("Freestyle 400m", Course::Unknown ; "no marker")]
    #[test_case("1500m freestyle", Course::Unknown ; "distance is not a pool length")]
    #[test_case("250m warmup", Course::Unknown ; "pool token glued to digits")]
    fn test_classify_course(text: &str, expected: Course) {
        assert_eq!(classify_course(text), expected);
    }

    #[test]
    fn test_short_course_marker_rejects_regardless_of_position() {
        let short_first = "Freestyle 400m - 25m pool, also advertised 50m lanes";
        let long_first = "50m lanes advertised, Freestyle 400m in 25m pool";
        assert_eq!(classify_course(short_first), Course::ShortCourse);
        assert_eq!(classify_course(long_first), Course::ShortCourse);
        let (event, course) = classify_text(short_first, &TargetEvent::ALL);
        assert_eq!(event, Some(TargetEvent::Free400));
        assert_eq!(course, Course::ShortCourse);
    }

    #[test_case(json!("3:48.00"), Some(228.0) ; "minutes seconds hundredths")]
    #[test_case(json!("15:01.5"), Some(901.5) ; "single fraction digit")]
    #[test_case(json!("8:05"), Some(485.0) ; "no fraction")]
    #[test_case(json!("3:48,21"), Some(228.21) ; "comma decimal")]
    #[test_case(json!("228.21"), Some(228.21) ; "bare seconds string")]
    #[test_case(json!(480), Some(480.0) ; "integer seconds")]
    #[test_case(json!("3:75.00"), None ; "seconds out of range")]
    #[test_case(json!("1:58:12.3"), None ; "hours not accepted")]
    #[test_case(json!("DSQ"), None ; "marker")]
    #[test_case(json!(0), None ; "zero")]
    #[test_case(json!(-3.0), None ; "negative")]
    #[test_case(json!(null), None ; "null")]
    fn test_parse_time(value: Value, expected: Option<f64>) {
        match (parse_time(&value), expected) {
            (Some(actual), Some(expected)) => assert!((actual - expected).abs() < 1e-9),
            (actual, expected) => assert_eq!(actual, expected),
        }
    }

    #[test_case(json!("2025-07-01"), Some((2025, 7, 1)) ; "iso date")]
    #[test_case(json!("2025-07-01T18:30:00+00:00"), Some((2025, 7, 1)) ; "iso datetime")]
    #[test_case(json!("01/07/2025"), Some((2025, 7, 1)) ; "day first slashes")]
    #[test_case(json!("01.07.2025"), Some((2025, 7, 1)) ; "day first dots")]
    #[test_case(json!("20250701"), Some((2025, 7, 1)) ; "compact string")]
    #[test_case(json!(20250701), Some((2025, 7, 1)) ; "compact number")]
    #[test_case(json!("01 Jul 2025"), Some((2025, 7, 1)) ; "month name")]
    #[test_case(json!("2025-13-01"), None ; "invalid month")]
    #[test_case(json!("yesterday"), None ; "free text")]
    fn test_parse_date(value: Value, expected: Option<(i32, u32, u32)>) {
        let expected = expected.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(parse_date(&value), expected);
    }
}
