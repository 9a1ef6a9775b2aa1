//! Adapters for the outside world
//!
//! - [`results`] talks to the upstream results service
//! - [`output`] writes joined rows to disk

pub mod output;
pub mod results;
