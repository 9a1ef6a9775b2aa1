//! Durable cache record
//!
//! One [`CacheEntry`] per athlete, stored as a JSON file named by the SHA-256
//! digest of the athlete id.

use crate::domain::{AthleteId, CandidatePerformance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Classified performances for one athlete plus the time they were written
///
/// # Examples
///
/// ```
/// use swimbest::core::cache::CacheEntry;
/// use swimbest::domain::AthleteId;
///
/// let athlete = AthleteId::new("1003542").unwrap();
/// let entry = CacheEntry::new(athlete.clone(), "strict;64;400 Free", Vec::new());
///
/// assert!(entry.is_valid_for(&athlete));
/// assert!(entry.was_scanned_with("strict;64;400 Free"));
/// assert!(entry.is_fresh(None, chrono::Utc::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Athlete the performances belong to
    pub athlete_id: AthleteId,

    /// Last write time, used for TTL checks
    pub written_at: DateTime<Utc>,

    /// Scan settings the performances were classified under
    ///
    /// Records written without one never match a lookup.
    #[serde(default)]
    pub scan_fingerprint: String,

    /// Retained candidates, already filtered by course
    pub performances: Vec<CandidatePerformance>,
}

impl CacheEntry {
    pub fn new(
        athlete_id: AthleteId,
        scan_fingerprint: impl Into<String>,
        performances: Vec<CandidatePerformance>,
    ) -> Self {
        Self {
            athlete_id,
            written_at: Utc::now(),
            scan_fingerprint: scan_fingerprint.into(),
            performances,
        }
    }

    /// File name of the durable record for `athlete_id`
    ///
    /// Hashing keeps arbitrary upstream ids filesystem-safe.
    pub fn file_name(athlete_id: &AthleteId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(athlete_id.as_str().as_bytes());
        let digest = hasher.finalize();
        format!("{digest:x}.json")
    }

    /// Whether the entry is still usable at `now`
    ///
    /// `ttl = None` means entries never expire. Entries stamped in the future
    /// (clock skew) count as fresh.
    pub fn is_fresh(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        let Some(ttl) = ttl else {
            return true;
        };
        match (now - self.written_at).to_std() {
            Ok(age) => age <= ttl,
            Err(_) => true,
        }
    }

    /// Structural validity for a lookup of `athlete_id`
    pub fn is_valid_for(&self, athlete_id: &AthleteId) -> bool {
        &self.athlete_id == athlete_id && self.performances.iter().all(|p| p.is_valid())
    }

    pub fn was_scanned_with(&self, fingerprint: &str) -> bool {
        !self.scan_fingerprint.is_empty() && self.scan_fingerprint == fingerprint
    }
}
