//! Performance source trait
//!
//! The pipeline only needs "give me whatever the upstream knows about this
//! athlete". [`PerformanceSource`] is that seam; [`super::ResultsClient`] is the
//! HTTP implementation and tests substitute scripted sources.

use crate::domain::{AthleteId, FetchError};
use async_trait::async_trait;
use serde_json::Value;

/// Result of walking an ordered endpoint list
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// First endpoint that answered with a non-empty JSON document
    Found {
        payload: Value,
        /// Template that produced the payload
        endpoint: String,
    },
    /// Every endpoint gave a definitive "nothing here" answer
    NotFound,
}

impl FetchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found { .. })
    }

    pub fn into_payload(self) -> Option<Value> {
        match self {
            FetchOutcome::Found { payload, .. } => Some(payload),
            FetchOutcome::NotFound => None,
        }
    }
}

/// Upstream source of athlete performance payloads
///
/// Implementations must be safe to call from many workers at once.
///
/// # Errors
///
/// [`FetchError::Unreachable`] means every endpoint failed with a transport
/// or server error after retries, as opposed to [`FetchOutcome::NotFound`].
#[async_trait]
pub trait PerformanceSource: Send + Sync {
    /// Fetch the performance payload for one athlete
    async fn fetch_athlete(&self, athlete_id: &AthleteId) -> Result<FetchOutcome, FetchError>;

    /// Human-readable name of the source, for logging
    fn name(&self) -> &str {
        "performance-source"
    }
}
