//! Performance classification
//!
//! Turns an upstream athlete payload of unknown shape into a list of
//! [`CandidatePerformance`](crate::domain::CandidatePerformance) values:
//!
//! - [`text`] - event/course recognition and time/date parsing on plain values
//! - [`walk`] - depth-bounded traversal with ancestor context
//! - [`scanner`] - the visitor that finds performance-shaped objects

pub mod scanner;
pub mod text;
pub mod walk;

pub use scanner::{RejectionCounts, ScanOptions, ScanReport, TreeScanner};
pub use text::{classify_course, classify_event, classify_text, parse_date, parse_time};
pub use walk::{walk, JsonVisitor};
