//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod analyze;
pub mod init;
pub mod validate;
