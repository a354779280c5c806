// src/cli.rs

//! CLI argument parsing using `clap`.

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

/// Command-line arguments for `autosched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "autosched",
    version,
    about = "Move or resize a task and reschedule everything that depends on it.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    ///
    /// Default: `Autosched.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Autosched.toml")]
    pub project: String,

    /// Task to move or resize. Without it the project is printed.
    #[arg(long, value_name = "ID")]
    pub task: Option<String>,

    /// Move the task to start at this RFC 3339 instant, keeping its duration.
    #[arg(long, value_name = "START", requires = "task", conflicts_with = "resize")]
    pub move_to: Option<DateTime<Utc>>,

    /// Give the task a new start and end (RFC 3339).
    #[arg(
        long,
        num_args = 2,
        value_names = ["START", "END"],
        requires = "task"
    )]
    pub resize: Option<Vec<DateTime<Utc>>>,

    /// Print the impact analysis and cascade plan without applying anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Undo the gesture right after applying it and print the restored
    /// schedule.
    #[arg(long, conflicts_with = "dry_run")]
    pub undo: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AUTOSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
