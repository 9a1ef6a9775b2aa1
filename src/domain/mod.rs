//! Domain models and types for Swimbest.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`AthleteId`], [`RaceId`])
//! - **Performance model** ([`TargetEvent`], [`Course`], [`CandidatePerformance`], [`BestTimeRecord`])
//! - **Work units** ([`RaceAssignment`], [`RaceEntry`], [`AthleteTask`], [`TaskState`])
//! - **Output rows** ([`JoinedRow`], [`BestMark`])
//! - **Error types** ([`SwimbestError`], [`FetchError`], [`CacheError`], [`PipelineError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so an athlete id can never be passed
//! where a race id is expected:
//!
//! ```rust
//! use swimbest::domain::{AthleteId, RaceId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let athlete = AthleteId::new("1003542")?;
//! let race = RaceId::new("4725")?;
//! // let wrong: AthleteId = race;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod performance;
pub mod result;
pub mod row;
pub mod task;

// Re-export commonly used types for convenience
pub use errors::{CacheError, FetchError, PipelineError, SwimbestError};
pub use ids::{AthleteId, RaceId};
pub use performance::{BestKind, BestTimeRecord, CandidatePerformance, Course, TargetEvent};
pub use result::Result;
pub use row::{BestMark, JoinedRow};
pub use task::{AthleteTask, RaceAssignment, RaceEntry, TaskState};
