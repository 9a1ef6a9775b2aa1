//! Candidate performance extraction from payloads of unknown shape
//!
//! The scanner walks the whole document and treats any object carrying a
//! time-like field plus either a date-like or a label-like field as a
//! performance candidate. Everything else about the candidate (event label,
//! date fallback, meet name and country, course markers) is resolved from the
//! object itself first and then from its enclosing objects, nearest first.
//!
//! Field names are matched case-insensitively with `_` and `-` ignored, so
//! `swim_time`, `SwimTime` and `swimtime` are the same alias.

use super::text::{classify_course, classify_event, parse_date, parse_time};
use super::walk::{walk, JsonVisitor};
use crate::config::{CoursePolicy, PipelineConfig};
use crate::domain::{CandidatePerformance, Course, SwimbestError, TargetEvent};
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Time-like fields, highest priority first
const TIME_ALIASES: [&str; 7] = [
    "time",
    "swimtime",
    "finaltime",
    "resulttime",
    "besttime",
    "result",
    "mark",
];

/// Date-like fields, highest priority first
const DATE_ALIASES: [&str; 8] = [
    "date",
    "swimdate",
    "resultdate",
    "racedate",
    "eventdate",
    "competitiondate",
    "startdate",
    "datefrom",
];

/// Label fields read from the candidate object itself
const LABEL_ALIASES: [&str; 8] = [
    "event",
    "eventname",
    "discipline",
    "disciplinename",
    "race",
    "racename",
    "label",
    "style",
];

/// Sub-objects that may carry the label, checked in this order
const LABEL_OBJECT_ALIASES: [&str; 3] = ["discipline", "event", "race"];

/// Label fields read from a label sub-object
const NESTED_LABEL_ALIASES: [&str; 6] = [
    "name",
    "disciplinename",
    "eventname",
    "title",
    "label",
    "description",
];

const DISTANCE_ALIASES: [&str; 2] = ["distance", "length"];

const STROKE_ALIASES: [&str; 3] = ["stroke", "strokename", "swimstyle"];

const COURSE_ALIASES: [&str; 7] = [
    "course",
    "coursetype",
    "poolcourse",
    "poollength",
    "lengthofpool",
    "poolsize",
    "pool",
];

const MEET_ALIASES: [&str; 7] = [
    "meetname",
    "meet",
    "competitionname",
    "competition",
    "officialname",
    "championshipname",
    "championship",
];

const MEET_COUNTRY_ALIASES: [&str; 5] = [
    "meetcountry",
    "meetnation",
    "countrycode",
    "nation",
    "country",
];

/// Scanner settings
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Events to recognise, in match priority order
    pub targets: Vec<TargetEvent>,
    /// Treatment of candidates without a course marker
    pub course_policy: CoursePolicy,
    /// Maximum nesting depth visited
    pub max_depth: usize,
}

impl ScanOptions {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, SwimbestError> {
        let targets = config
            .parsed_target_events()
            .map_err(SwimbestError::Configuration)?;
        Ok(Self {
            targets,
            course_policy: config.course_policy,
            max_depth: config.max_depth,
        })
    }

    /// Stable summary of every setting that changes what a scan keeps
    ///
    /// Targets stay in priority order, since a label naming two distances
    /// classifies as whichever comes first.
    pub fn fingerprint(&self) -> String {
        let policy = match self.course_policy {
            CoursePolicy::Strict => "strict",
            CoursePolicy::Lenient => "lenient",
        };
        let targets: Vec<&str> = self.targets.iter().map(TargetEvent::label).collect();
        format!("{policy};{};{}", self.max_depth, targets.join(","))
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            targets: TargetEvent::ALL.to_vec(),
            course_policy: CoursePolicy::Strict,
            max_depth: 64,
        }
    }
}

/// Why candidate-shaped objects were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub unparseable_time: usize,
    pub missing_date: usize,
    pub unclassified_event: usize,
    pub short_course: usize,
    pub unknown_course: usize,
    pub depth_limited: usize,
}

impl RejectionCounts {
    pub fn total(&self) -> usize {
        self.unparseable_time
            + self.missing_date
            + self.unclassified_event
            + self.short_course
            + self.unknown_course
            + self.depth_limited
    }
}

/// Outcome of scanning one payload
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Object nodes inspected
    pub objects_visited: usize,
    /// Retained candidates, in document order
    pub candidates: Vec<CandidatePerformance>,
    /// Drop counts by reason
    pub rejected: RejectionCounts,
}

/// Extracts [`CandidatePerformance`] values from arbitrary JSON
#[derive(Debug, Clone, Default)]
pub struct TreeScanner {
    options: ScanOptions,
}

impl TreeScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Retained candidates of `payload`, in document order
    ///
    /// ```
    /// use swimbest::core::classify::TreeScanner;
    /// use serde_json::json;
    ///
    /// let payload = json!({
    ///     "meets": [{
    ///         "meetName": "Italian Championships LCM",
    ///         "results": [{"event": "400m Freestyle", "time": "3:48.00", "date": "2025-07-01"}]
    ///     }]
    /// });
    /// let candidates = TreeScanner::default().extract(&payload);
    /// assert_eq!(candidates.len(), 1);
    /// assert_eq!(candidates[0].seconds, 228.0);
    /// ```
    pub fn extract(&self, payload: &Value) -> Vec<CandidatePerformance> {
        self.scan(payload).candidates
    }

    /// Scan `payload`, returning candidates together with drop counts
    pub fn scan(&self, payload: &Value) -> ScanReport {
        let mut collector = CandidateCollector {
            options: &self.options,
            report: ScanReport::default(),
        };
        walk(payload, &mut collector, self.options.max_depth);
        collector.report
    }
}

struct CandidateCollector<'o> {
    options: &'o ScanOptions,
    report: ScanReport,
}

impl<'a, 'o> JsonVisitor<'a> for CandidateCollector<'o> {
    fn visit_object(
        &mut self,
        object: &'a Map<String, Value>,
        ancestors: &[&'a Map<String, Value>],
    ) {
        self.report.objects_visited += 1;

        let fields = Fields::of(object);
        let Some(time_value) = fields.scalar(&TIME_ALIASES) else {
            return;
        };
        let own_date = fields.scalar(&DATE_ALIASES);
        let label = resolve_label(&fields);
        if own_date.is_none() && label.is_none() {
            return;
        }

        let rejected = &mut self.report.rejected;
        let Some(seconds) = parse_time(time_value) else {
            rejected.unparseable_time += 1;
            return;
        };
        let Some(date) = resolve_date(own_date, ancestors) else {
            rejected.missing_date += 1;
            return;
        };
        let Some(event) = label
            .as_deref()
            .and_then(|label| classify_event(label, &self.options.targets))
        else {
            rejected.unclassified_event += 1;
            return;
        };

        let assembled = assemble_course_text(label.as_deref(), &fields, ancestors);
        let course = classify_course(&assembled);
        match (course, self.options.course_policy) {
            (Course::ShortCourse, _) => {
                rejected.short_course += 1;
                return;
            }
            (Course::Unknown, CoursePolicy::Strict) => {
                rejected.unknown_course += 1;
                return;
            }
            _ => {}
        }

        let candidate = CandidatePerformance {
            event,
            course,
            seconds,
            date,
            meet_name: resolve_meet_name(&fields, ancestors),
            meet_country: resolve_meet_country(&fields, ancestors),
        };
        self.report.candidates.push(candidate);
    }

    fn depth_exceeded(&mut self, _depth: usize) {
        self.report.rejected.depth_limited += 1;
    }
}

/// Object fields keyed by normalised name, in document order
struct Fields<'a> {
    entries: Vec<(String, &'a Value)>,
}

impl<'a> Fields<'a> {
    fn of(object: &'a Map<String, Value>) -> Self {
        let entries = object
            .iter()
            .map(|(key, value)| (normalize_key(key), value))
            .collect();
        Self { entries }
    }

    fn find(&self, aliases: &[&str], accept: impl Fn(&Value) -> bool) -> Option<&'a Value> {
        aliases.iter().find_map(|alias| {
            self.entries
                .iter()
                .find(|(key, value)| key == alias && accept(*value))
                .map(|(_, value)| *value)
        })
    }

    /// First non-empty string or number under the aliases
    fn scalar(&self, aliases: &[&str]) -> Option<&'a Value> {
        self.find(aliases, |value| match value {
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(_) => true,
            _ => false,
        })
    }

    fn string(&self, aliases: &[&str]) -> Option<&'a str> {
        self.find(aliases, |value| value.as_str().is_some_and(|s| !s.trim().is_empty()))
            .and_then(Value::as_str)
            .map(str::trim)
    }

    fn object(&self, aliases: &[&str]) -> Option<&'a Map<String, Value>> {
        self.find(aliases, Value::is_object).and_then(Value::as_object)
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Label text built from a label field plus any distance/stroke fields
fn label_text(fields: &Fields<'_>, label_aliases: &[&str]) -> Option<String> {
    let parts: Vec<String> = [
        fields.string(label_aliases).map(str::to_string),
        fields.scalar(&DISTANCE_ALIASES).and_then(scalar_text),
        fields.string(&STROKE_ALIASES).map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Own label first, then the first label sub-object that yields one
fn resolve_label(fields: &Fields<'_>) -> Option<String> {
    label_text(fields, &LABEL_ALIASES).or_else(|| {
        LABEL_OBJECT_ALIASES.iter().find_map(|alias| {
            fields
                .object(&[*alias])
                .and_then(|sub| label_text(&Fields::of(sub), &NESTED_LABEL_ALIASES))
        })
    })
}

fn resolve_date(own: Option<&Value>, ancestors: &[&Map<String, Value>]) -> Option<NaiveDate> {
    if let Some(value) = own {
        return parse_date(value);
    }
    ancestors.iter().rev().find_map(|ancestor| {
        Fields::of(ancestor)
            .scalar(&DATE_ALIASES)
            .and_then(parse_date)
    })
}

/// Course field rendered as text the course classifier understands
fn course_text(fields: &Fields<'_>) -> Option<String> {
    let value = fields.scalar(&COURSE_ALIASES)?;
    let text = match value {
        Value::Number(n) => format!("{n}m"),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "l" | "lc" | "long" => "lcm".to_string(),
            "s" | "sc" | "short" => "scm".to_string(),
            "50" => "50m".to_string(),
            "25" => "25m".to_string(),
            other => other.to_string(),
        },
        _ => return None,
    };
    Some(text)
}

fn meet_name(fields: &Fields<'_>) -> Option<String> {
    fields
        .string(&MEET_ALIASES)
        .map(str::to_string)
        .or_else(|| {
            fields.object(&MEET_ALIASES).and_then(|meet| {
                Fields::of(meet)
                    .string(&["name", "officialname", "title"])
                    .map(str::to_string)
            })
        })
}

fn country_code(fields: &Fields<'_>) -> Option<String> {
    let code = fields
        .string(&MEET_COUNTRY_ALIASES)
        .filter(|code| code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase);
    code.or_else(|| {
        fields
            .object(&MEET_ALIASES)
            .and_then(|meet| country_code(&Fields::of(meet)))
    })
}

/// Label, course fields and meet names of the candidate and every ancestor
fn assemble_course_text(
    label: Option<&str>,
    fields: &Fields<'_>,
    ancestors: &[&Map<String, Value>],
) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.extend(label.map(str::to_string));
    parts.extend(course_text(fields));
    parts.extend(meet_name(fields));
    for ancestor in ancestors {
        let ancestor_fields = Fields::of(ancestor);
        parts.extend(label_text(&ancestor_fields, &LABEL_ALIASES));
        parts.extend(course_text(&ancestor_fields));
        parts.extend(meet_name(&ancestor_fields));
    }
    parts.join(" | ")
}

fn resolve_meet_name(fields: &Fields<'_>, ancestors: &[&Map<String, Value>]) -> Option<String> {
    meet_name(fields).or_else(|| {
        ancestors
            .iter()
            .rev()
            .find_map(|ancestor| meet_name(&Fields::of(ancestor)))
    })
}

fn resolve_meet_country(fields: &Fields<'_>, ancestors: &[&Map<String, Value>]) -> Option<String> {
    country_code(fields).or_else(|| {
        ancestors
            .iter()
            .rev()
            .find_map(|ancestor| country_code(&Fields::of(ancestor)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lenient() -> TreeScanner {
        TreeScanner::new(ScanOptions {
            course_policy: CoursePolicy::Lenient,
            ..Default::default()
        })
    }

    #[test]
    fn test_fingerprint_tracks_every_scan_setting() {
        let base = ScanOptions::default();
        assert_eq!(base.fingerprint(), "strict;64;400 Free,800 Free,1500 Free");

        let lenient = ScanOptions {
            course_policy: CoursePolicy::Lenient,
            ..Default::default()
        };
        let narrowed = ScanOptions {
            targets: vec![TargetEvent::Free400],
            ..Default::default()
        };
        let reordered = ScanOptions {
            targets: vec![TargetEvent::Free1500, TargetEvent::Free800, TargetEvent::Free400],
            ..Default::default()
        };
        let shallow = ScanOptions {
            max_depth: 8,
            ..Default::default()
        };
        for other in [&lenient, &narrowed, &reordered, &shallow] {
            assert_ne!(other.fingerprint(), base.fingerprint());
        }
        assert_eq!(ScanOptions::default().fingerprint(), base.fingerprint());
    }

    #[test]
    fn test_extracts_nested_performance_with_ancestor_context() {
        let payload = json!({
            "athlete": {"name": "Test Swimmer", "nationality": "ITA"},
            "meets": [{
                "competition": {"name": "Settecolli LCM", "countryCode": "ita"},
                "startDate": "2025-06-20",
                "results": [
                    {"DisciplineName": "Men 800m Freestyle", "Time": "7:45.12"}
                ]
            }]
        });

        let candidates = TreeScanner::default().extract(&payload);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.event, TargetEvent::Free800);
        assert_eq!(c.course, Course::LongCourse);
        assert!((c.seconds - 465.12).abs() < 1e-9);
        assert_eq!(c.date, date(2025, 6, 20));
        assert_eq!(c.meet_name.as_deref(), Some("Settecolli LCM"));
        assert_eq!(c.meet_country.as_deref(), Some("ITA"));
    }

    #[test]
    fn test_label_from_nested_discipline_object() {
        let payload = json!([{
            "swim_time": 912.3,
            "date": "2024-08-01",
            "course": "LCM",
            "discipline": {"name": "1500m Freestyle"}
        }]);

        let candidates = TreeScanner::default().extract(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].event, TargetEvent::Free1500);
        assert_eq!(candidates[0].course, Course::LongCourse);
    }

    #[test]
    fn test_label_sub_object_priority_discipline_before_event() {
        let payload = json!({
            "time": "3:50.00",
            "date": "2025-03-01",
            "poolLength": 50,
            "event": {"name": "800m Freestyle"},
            "discipline": {"name": "400m Freestyle"}
        });

        let candidates = TreeScanner::default().extract(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].event, TargetEvent::Free400);
    }

    #[test]
    fn test_distance_and_stroke_fields_form_label() {
        let payload = json!({
            "results": [
                {"distance": 400, "stroke": "FREE", "course": "L", "time": "3:49.10", "date": "2025-04-12"}
            ]
        });

        let candidates = TreeScanner::default().extract(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].event, TargetEvent::Free400);
    }

    #[test]
    fn test_short_course_token_anywhere_rejects() {
        let payload = json!({
            "results": [{
                "event": "Freestyle 400m (25m pool, 50m warm-up lanes)",
                "time": "3:48.00",
                "date": "2025-03-01"
            }]
        });

        let report = TreeScanner::default().scan(&payload);
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected.short_course, 1);
    }

    #[test]
    fn test_short_course_in_ancestor_meet_rejects_long_course_label() {
        let payload = json!({
            "meetName": "Winter Open (25m)",
            "results": [
                {"event": "400m Freestyle LCM", "time": "3:48.00", "date": "2025-01-10"}
            ]
        });

        let report = lenient().scan(&payload);
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected.short_course, 1);
    }

    #[test]
    fn test_unknown_course_depends_on_policy() {
        let payload = json!({"event": "400m Freestyle", "time": "3:48.00", "date": "2025-03-01"});

        let strict = TreeScanner::default().scan(&payload);
        assert!(strict.candidates.is_empty());
        assert_eq!(strict.rejected.unknown_course, 1);

        let lenient = lenient().scan(&payload);
        assert_eq!(lenient.candidates.len(), 1);
        assert_eq!(lenient.candidates[0].course, Course::Unknown);
    }

    #[test]
    fn test_time_with_label_but_no_date_anywhere_is_dropped() {
        let payload = json!({"event": "400m Freestyle LCM", "time": "3:48.00"});
        let report = TreeScanner::default().scan(&payload);
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected.missing_date, 1);
    }

    #[test]
    fn test_unparseable_time_drops_node_without_error() {
        let payload = json!({
            "course": "LCM",
            "results": [
                {"event": "400m Freestyle", "time": "DNS", "date": "2025-03-01"},
                {"event": "400m Freestyle", "time": "3:52.40", "date": "2025-03-02"}
            ]
        });

        let report = TreeScanner::default().scan(&payload);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.rejected.unparseable_time, 1);
    }

    #[test]
    fn test_objects_without_time_are_not_candidates() {
        let payload = json!({
            "name": "Test Swimmer",
            "events": [{"event": "400m Freestyle", "date": "2025-03-01"}]
        });

        let report = TreeScanner::default().scan(&payload);
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected.total(), 0);
        assert_eq!(report.objects_visited, 2);
    }

    #[test]
    fn test_payload_with_only_short_course_results_yields_nothing() {
        let payload = json!({
            "meets": [
                {"course": "SCM", "results": [
                    {"event": "400 Free", "time": "3:44.00", "date": "2024-12-10"},
                    {"event": "1500 Free", "time": "14:40.00", "date": "2024-12-12"}
                ]}
            ]
        });

        let report = TreeScanner::default().scan(&payload);
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected.short_course, 2);
    }

    #[test]
    fn test_depth_limit_is_reported() {
        let mut payload = json!({"event": "400m Freestyle LCM", "time": "3:48.00", "date": "2025-03-01"});
        for _ in 0..10 {
            payload = json!({"wrapper": payload});
        }
        let scanner = TreeScanner::new(ScanOptions {
            max_depth: 5,
            ..Default::default()
        });

        let report = scanner.scan(&payload);
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected.depth_limited, 1);
    }

    #[test]
    fn test_scalar_payload_yields_nothing() {
        assert!(TreeScanner::default().extract(&json!("not a tree")).is_empty());
        assert!(TreeScanner::default().extract(&json!(null)).is_empty());
    }

    #[test]
    fn test_invalid_meet_country_is_dropped() {
        let payload = json!({
            "event": "400m Freestyle LCM",
            "time": "3:48.00",
            "date": "2025-03-01",
            "country": "Italy"
        });
        let candidates = TreeScanner::default().extract(&payload);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].meet_country.is_none());
    }
}
