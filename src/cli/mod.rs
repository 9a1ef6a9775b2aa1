//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Swimbest using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Swimbest - pool best times for open-water race finishers
#[derive(Parser, Debug)]
#[command(name = "swimbest")]
#[command(version, about, long_about = None)]
#[command(author = "Swimbest Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "swimbest.toml", env = "SWIMBEST_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SWIMBEST_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join configured race results with each finisher's pool bests
    Analyze(commands::analyze::AnalyzeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
