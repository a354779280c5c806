// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Validation, cycle and threshold errors are raised before any task is
//! touched. Only [`AutoschedError::Collaborator`] is produced after writes
//! have started, and by then the partial writes have been rolled back.

use thiserror::Error;

use crate::dag::TaskId;
use crate::dag::impact::Recommendation;

#[derive(Error, Debug)]
pub enum AutoschedError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cycle detected in dependency graph: {}", path.join(" -> "))]
    CycleDetected { path: Vec<TaskId> },

    #[error(
        "Impact threshold exceeded ({recommendation}): \
         {affected} affected tasks, ~{estimated_ms:.0}ms estimated"
    )]
    ThresholdExceeded {
        affected: usize,
        estimated_ms: f64,
        recommendation: Recommendation,
    },

    #[error("Task store rejected update for '{task}': {source}")]
    Collaborator {
        task: TaskId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Command history busy: {0}")]
    HistoryBusy(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AutoschedError>;
