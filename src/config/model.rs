// src/config/model.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::dag::{Dependency, ImpactPolicy, SchedulingOptions, Task, TaskSchedule};
use crate::types::{DependencyType, Lag, ReviewAction};

/// Project file as read from TOML, before validation.
///
/// ```toml
/// [project]
/// id = "demo"
///
/// [scheduling]
/// max_cascading_depth = 5
///
/// [task.P]
/// start = "2024-01-07T00:00:00Z"
/// end = "2024-01-10T00:00:00Z"
///
/// [task.S]
/// start = "2024-01-05T00:00:00Z"
/// end = "2024-01-08T00:00:00Z"
///
/// [[dependency]]
/// from = "P"
/// to = "S"
/// type = "FS"
/// lag = "2d"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProjectFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub scheduling: SchedulingConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// All tasks from `[task.<id>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All edges from `[[dependency]]`.
    #[serde(default)]
    pub dependency: Vec<DependencyConfig>,
}

/// Validated project file. Build it with `ProjectFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub project: ProjectSection,
    pub scheduling: SchedulingConfig,
    pub telemetry: TelemetryConfig,
    pub task: BTreeMap<String, TaskConfig>,
    pub dependency: Vec<DependencyConfig>,
}

impl ProjectFile {
    pub(crate) fn new_unchecked(raw: RawProjectFile) -> Self {
        Self {
            project: raw.project,
            scheduling: raw.scheduling,
            telemetry: raw.telemetry,
            task: raw.task,
            dependency: raw.dependency,
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.task
            .iter()
            .map(|(id, tc)| Task {
                id: id.clone(),
                schedule: TaskSchedule::new(tc.start, tc.end),
                progress: tc.progress,
            })
            .collect()
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.dependency.iter().map(DependencyConfig::to_dependency).collect()
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    #[serde(default = "default_project_id")]
    pub id: String,
}

fn default_project_id() -> String {
    "default".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            id: default_project_id(),
        }
    }
}

/// `[scheduling]` section: the auto-scheduling configuration surface.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// When `false`, every gesture is a plain single-task edit.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_cascading_depth")]
    pub max_cascading_depth: usize,

    /// Lag for dependencies that do not declare one, e.g. `"0h"`, `"1d"`.
    #[serde(default)]
    pub default_lag: Lag,

    #[serde(default = "default_true")]
    pub preserve_task_duration: bool,

    #[serde(default = "default_performance_threshold_ms")]
    pub performance_threshold_ms: f64,

    #[serde(default = "default_max_affected_tasks")]
    pub max_affected_tasks: usize,

    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,

    /// `"refuse"` (default) or `"proceed"` when impact analysis says review.
    #[serde(default)]
    pub on_review: ReviewAction,

    #[serde(default = "default_estimate_base_ms")]
    pub estimate_base_ms: f64,

    #[serde(default = "default_estimate_per_task_ms")]
    pub estimate_per_task_ms: f64,
}

fn default_true() -> bool {
    true
}

fn default_max_cascading_depth() -> usize {
    5
}

fn default_performance_threshold_ms() -> f64 {
    500.0
}

fn default_max_affected_tasks() -> usize {
    20
}

fn default_max_history_size() -> usize {
    20
}

fn default_estimate_base_ms() -> f64 {
    10.0
}

fn default_estimate_per_task_ms() -> f64 {
    20.0
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_cascading_depth: default_max_cascading_depth(),
            default_lag: Lag::zero(),
            preserve_task_duration: true,
            performance_threshold_ms: default_performance_threshold_ms(),
            max_affected_tasks: default_max_affected_tasks(),
            max_history_size: default_max_history_size(),
            on_review: ReviewAction::default(),
            estimate_base_ms: default_estimate_base_ms(),
            estimate_per_task_ms: default_estimate_per_task_ms(),
        }
    }
}

impl SchedulingConfig {
    pub fn scheduling_options(&self) -> SchedulingOptions {
        SchedulingOptions {
            max_cascading_depth: self.max_cascading_depth,
            preserve_task_duration: self.preserve_task_duration,
            default_lag: self.default_lag,
        }
    }

    pub fn impact_policy(&self) -> ImpactPolicy {
        ImpactPolicy {
            max_affected_tasks: self.max_affected_tasks,
            performance_threshold_ms: self.performance_threshold_ms,
            estimate_base_ms: self.estimate_base_ms,
            estimate_per_task_ms: self.estimate_per_task_ms,
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Records buffered before a batch is sent.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Period of the background telemetry flush.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Period of the background history cleanup.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_batch_size() -> usize {
    5
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_interval_secs: default_flush_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// RFC 3339 timestamp, quoted.
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Completion percentage, 0..=100.
    #[serde(default)]
    pub progress: u8,
}

/// `[[dependency]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyConfig {
    /// Predecessor task id.
    pub from: String,
    /// Successor task id.
    pub to: String,
    /// `"FS"` (default), `"SS"`, `"FF"` or `"SF"`.
    #[serde(default, rename = "type")]
    pub kind: DependencyType,
    /// Optional lag; falls back to `scheduling.default_lag`.
    #[serde(default)]
    pub lag: Option<Lag>,
}

impl DependencyConfig {
    pub fn to_dependency(&self) -> Dependency {
        Dependency {
            predecessor: self.from.clone(),
            successor: self.to.clone(),
            kind: self.kind,
            lag: self.lag,
        }
    }
}
