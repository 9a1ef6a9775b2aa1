//! Race results payload parsing
//!
//! Race payloads come in a few shapes: entries under `Heats[0].Results`,
//! under a top-level `Results`, or as a bare array. Field names follow the
//! upstream PascalCase convention with a handful of aliases.

use super::client::ResultsClient;
use super::source::FetchOutcome;
use crate::config::RaceConfig;
use crate::core::classify::parse_date;
use crate::domain::{AthleteId, RaceAssignment, RaceEntry, RaceId, SwimbestError};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::VecDeque;

const ID_KEYS: [&str; 3] = ["PersonId", "AthleteId", "Id"];
const FIRST_NAME_KEYS: [&str; 2] = ["FirstName", "PreferredFirstName"];
const LAST_NAME_KEYS: [&str; 2] = ["LastName", "PreferredLastName"];
const FULL_NAME_KEYS: [&str; 3] = ["FullName", "AthleteName", "Name"];
const NATIONALITY_KEYS: [&str; 4] = ["NAT", "Nation", "CountryCode", "Nationality"];
const TIME_KEYS: [&str; 2] = ["Time", "Result"];
const RANK_KEYS: [&str; 2] = ["Rank", "Position"];
/// Invalid-result marker (DNF, DSQ, ...)
const IRM_KEYS: [&str; 2] = ["IRM", "ResultStatus"];

const DATE_KEYS: [&str; 6] = ["Date", "DateFrom", "StartDate", "EventDate", "RaceDate", "From"];
const RACE_NAME_KEYS: [&str; 4] = ["DisciplineName", "EventName", "EventResultName", "Name"];

/// How far below the payload root reference dates are looked for
const DATE_SEARCH_DEPTH: usize = 3;

/// Build the assignment for a configured race from its results payload
///
/// A pinned `reference_date` in the race config wins over anything found in
/// the payload. The assignment carries `None` as reference date when neither
/// source has one; the pipeline refuses such races.
///
/// # Errors
///
/// Returns a validation error if the configured race id is blank.
pub fn build_assignment(
    race: &RaceConfig,
    payload: Option<&Value>,
) -> Result<RaceAssignment, SwimbestError> {
    let race_id = RaceId::new(race.race_id.as_str()).map_err(SwimbestError::Validation)?;

    let reference_date = race
        .parsed_reference_date()
        .or_else(|| payload.and_then(discover_reference_date));
    let race_name = race
        .name
        .clone()
        .or_else(|| payload.and_then(discover_race_name));
    let entries = payload.map(parse_entries).unwrap_or_default();

    Ok(RaceAssignment {
        race_id,
        race_name,
        reference_date,
        entries,
    })
}

/// Fetch a configured race and build its assignment
///
/// A race the upstream has no data for yields an assignment without entries.
///
/// # Errors
///
/// Returns a fetch error if every race endpoint was unreachable, or a
/// validation error for a blank race id.
pub async fn load_assignment(
    client: &ResultsClient,
    race: &RaceConfig,
) -> Result<RaceAssignment, SwimbestError> {
    let race_id = RaceId::new(race.race_id.as_str()).map_err(SwimbestError::Validation)?;

    match client.fetch_race(&race_id).await? {
        FetchOutcome::Found { payload, endpoint } => {
            let assignment = build_assignment(race, Some(&payload))?;
            tracing::info!(
                race_id = %race_id,
                endpoint = %endpoint,
                entries = assignment.entries.len(),
                reference_date = ?assignment.reference_date,
                "Race results loaded"
            );
            Ok(assignment)
        }
        FetchOutcome::NotFound => {
            tracing::warn!(race_id = %race_id, "No results found for race");
            build_assignment(race, None)
        }
    }
}

/// Entries of a race results payload; entries without an id are skipped
pub fn parse_entries(payload: &Value) -> Vec<RaceEntry> {
    let results = result_list(payload);
    let mut entries = Vec::with_capacity(results.len());

    for result in results {
        let Some(object) = result.as_object() else {
            continue;
        };
        match parse_entry(object) {
            Some(entry) => entries.push(entry),
            None => tracing::debug!("Skipping race result without athlete id"),
        }
    }
    entries
}

fn result_list(payload: &Value) -> &[Value] {
    let from_heats = payload
        .get("Heats")
        .and_then(Value::as_array)
        .and_then(|heats| heats.first())
        .and_then(|heat| heat.get("Results"))
        .and_then(Value::as_array);
    let from_results = || payload.get("Results").and_then(Value::as_array);

    from_heats
        .or_else(from_results)
        .or_else(|| payload.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn parse_entry(object: &Map<String, Value>) -> Option<RaceEntry> {
    let athlete_id = text_field(object, &ID_KEYS).and_then(|id| AthleteId::new(id).ok())?;

    let first = text_field(object, &FIRST_NAME_KEYS).unwrap_or_default();
    let last = text_field(object, &LAST_NAME_KEYS).unwrap_or_default();
    let joined = format!("{first} {last}").trim().to_string();
    let display_name = if joined.is_empty() {
        text_field(object, &FULL_NAME_KEYS).unwrap_or_else(|| athlete_id.to_string())
    } else {
        joined
    };

    let rank = text_field(object, &IRM_KEYS).or_else(|| text_field(object, &RANK_KEYS));

    Some(RaceEntry {
        athlete_id,
        display_name,
        nationality: text_field(object, &NATIONALITY_KEYS),
        time: text_field(object, &TIME_KEYS),
        rank,
    })
}

/// First non-empty string or number under `keys`, as trimmed text
fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Shallowest date-like field of the payload, breadth first
pub fn discover_reference_date(payload: &Value) -> Option<NaiveDate> {
    let mut queue = VecDeque::from([(payload, 0usize)]);

    while let Some((node, depth)) = queue.pop_front() {
        match node {
            Value::Object(object) => {
                let found = DATE_KEYS
                    .iter()
                    .find_map(|key| object.get(*key).and_then(parse_date));
                if found.is_some() {
                    return found;
                }
                if depth < DATE_SEARCH_DEPTH {
                    queue.extend(object.values().map(|child| (child, depth + 1)));
                }
            }
            Value::Array(items) if depth < DATE_SEARCH_DEPTH => {
                queue.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }
    None
}

fn discover_race_name(payload: &Value) -> Option<String> {
    payload
        .as_object()
        .and_then(|object| text_field(object, &RACE_NAME_KEYS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn race(id: &str, date: Option<&str>) -> RaceConfig {
        RaceConfig {
            race_id: id.to_string(),
            name: None,
            reference_date: date.map(str::to_string),
        }
    }

    fn sample_payload() -> Value {
        json!({
            "DisciplineName": "Women 10km",
            "Heats": [{
                "Date": "2025-07-17T08:00:00",
                "Results": [
                    {"PersonId": 1003542, "FirstName": "Ginevra", "LastName": "Taddeucci", "NAT": "ITA", "Time": "2:02:10.4", "Rank": 1},
                    {"PersonId": "1002211", "FirstName": "Lisa", "LastName": "Pou", "NAT": "FRA", "Time": "2:02:12.0", "Rank": "2"},
                    {"PersonId": 1001000, "FirstName": "Ana", "LastName": "Marcela", "NAT": "BRA", "IRM": "DNF"},
                    {"FirstName": "No", "LastName": "Id"}
                ]
            }]
        })
    }

    #[test]
    fn test_parse_entries_from_first_heat() {
        let entries = parse_entries(&sample_payload());
        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.athlete_id.as_str(), "1003542");
        assert_eq!(first.display_name, "Ginevra Taddeucci");
        assert_eq!(first.nationality.as_deref(), Some("ITA"));
        assert_eq!(first.rank.as_deref(), Some("1"));
        assert!(first.is_completed());

        assert_eq!(entries[1].rank.as_deref(), Some("2"));
        assert!(!entries[2].is_completed());
    }

    #[test]
    fn test_parse_entries_from_results_or_bare_array() {
        let under_results = json!({"Results": [{"AthleteId": "9", "Name": "Solo Swimmer", "Result": "1:55:00"}]});
        let entries = parse_entries(&under_results);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "Solo Swimmer");
        assert_eq!(entries[0].time.as_deref(), Some("1:55:00"));

        let bare = json!([{"PersonId": "5", "Rank": 4}]);
        let entries = parse_entries(&bare);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "5");
    }

    #[test]
    fn test_parse_entries_unknown_shape() {
        assert!(parse_entries(&json!({"message": "no results"})).is_empty());
        assert!(parse_entries(&json!("oops")).is_empty());
    }

    #[test]
    fn test_discover_reference_date_prefers_shallowest() {
        let payload = json!({
            "Heats": [{"Date": "2025-07-17", "Results": [{"Date": "2024-01-01"}]}],
            "Competition": {"DateFrom": "2025-07-11"}
        });
        assert_eq!(
            discover_reference_date(&payload),
            NaiveDate::from_ymd_opt(2025, 7, 11)
        );
        assert_eq!(
            discover_reference_date(&sample_payload()),
            NaiveDate::from_ymd_opt(2025, 7, 17)
        );
        assert_eq!(discover_reference_date(&json!({"Heats": []})), None);
    }

    #[test]
    fn test_build_assignment_pinned_date_wins() {
        let assignment =
            build_assignment(&race("4725", Some("2025-07-20")), Some(&sample_payload())).unwrap();
        assert_eq!(assignment.reference_date, NaiveDate::from_ymd_opt(2025, 7, 20));
        assert_eq!(assignment.race_name.as_deref(), Some("Women 10km"));
        assert_eq!(assignment.entries.len(), 3);
    }

    #[test]
    fn test_build_assignment_without_payload_or_date() {
        let assignment = build_assignment(&race("4725", None), None).unwrap();
        assert!(assignment.reference_date.is_none());
        assert!(assignment.entries.is_empty());
    }

    #[test]
    fn test_build_assignment_rejects_blank_id() {
        assert!(build_assignment(&race("  ", None), None).is_err());
    }
}
