//! Results service integration
//!
//! - [`client`] - HTTP client with endpoint fallback and retries
//! - [`source`] - the [`PerformanceSource`] seam used by the pipeline
//! - [`race`] - race results payload parsing

pub mod client;
pub mod race;
pub mod source;

pub use client::{ResultsClient, ATHLETE_PLACEHOLDER, RACE_PLACEHOLDER};
pub use race::{build_assignment, discover_reference_date, load_assignment, parse_entries};
pub use source::{FetchOutcome, PerformanceSource};
