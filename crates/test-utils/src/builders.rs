#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use autosched::config::{
    DependencyConfig, ProjectFile, ProjectSection, RawProjectFile, SchedulingConfig, TaskConfig,
    TelemetryConfig,
};
use autosched::engine::{Collaborators, SchedulingSession, SessionEvent};
use autosched::store::MockTaskStore;
use autosched::types::{DependencyType, Lag, ReviewAction};

use crate::at;
use crate::telemetry::RecordingTelemetrySink;

/// Builder for a project (tasks, dependencies, settings) used across tests.
///
/// Days are counted with [`at`]: `task("A", 1, 3)` runs from Jan 1 to Jan 3.
pub struct ProjectBuilder {
    raw: RawProjectFile,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawProjectFile {
                project: ProjectSection {
                    id: "test".to_string(),
                },
                scheduling: SchedulingConfig::default(),
                telemetry: TelemetryConfig::default(),
                task: BTreeMap::new(),
                dependency: Vec::new(),
            },
        }
    }

    pub fn project_id(mut self, id: &str) -> Self {
        self.raw.project.id = id.to_string();
        self
    }

    pub fn task(self, id: &str, start_day: i64, end_day: i64) -> Self {
        self.task_config(id, TaskConfigBuilder::new(start_day, end_day).build())
    }

    pub fn task_config(mut self, id: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(id.to_string(), task);
        self
    }

    pub fn dep(mut self, from: &str, to: &str, kind: DependencyType) -> Self {
        self.raw.dependency.push(DependencyConfig {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            lag: None,
        });
        self
    }

    pub fn dep_with_lag(mut self, from: &str, to: &str, kind: DependencyType, lag: Lag) -> Self {
        self.raw.dependency.push(DependencyConfig {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            lag: Some(lag),
        });
        self
    }

    /// Finish-to-start edge without lag.
    pub fn fs(self, from: &str, to: &str) -> Self {
        self.dep(from, to, DependencyType::FinishToStart)
    }

    /// `T1 -> T2 -> ... -> Tn`, FS edges, each task two days long and packed
    /// back to back starting on day 1.
    pub fn chain(mut self, prefix: &str, n: usize) -> Self {
        for i in 1..=n {
            let start = 1 + 2 * (i as i64 - 1);
            self = self.task(&format!("{prefix}{i}"), start, start + 2);
            if i > 1 {
                self = self.fs(&format!("{prefix}{}", i - 1), &format!("{prefix}{i}"));
            }
        }
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.raw.scheduling.enabled = enabled;
        self
    }

    pub fn max_cascading_depth(mut self, depth: usize) -> Self {
        self.raw.scheduling.max_cascading_depth = depth;
        self
    }

    pub fn max_history_size(mut self, size: usize) -> Self {
        self.raw.scheduling.max_history_size = size;
        self
    }

    pub fn max_affected_tasks(mut self, n: usize) -> Self {
        self.raw.scheduling.max_affected_tasks = n;
        self
    }

    pub fn performance_threshold_ms(mut self, ms: f64) -> Self {
        self.raw.scheduling.performance_threshold_ms = ms;
        self
    }

    pub fn on_review(mut self, action: ReviewAction) -> Self {
        self.raw.scheduling.on_review = action;
        self
    }

    pub fn preserve_task_duration(mut self, preserve: bool) -> Self {
        self.raw.scheduling.preserve_task_duration = preserve;
        self
    }

    pub fn default_lag(mut self, lag: Lag) -> Self {
        self.raw.scheduling.default_lag = lag;
        self
    }

    pub fn telemetry_batch_size(mut self, size: usize) -> Self {
        self.raw.telemetry.batch_size = size;
        self
    }

    pub fn build_project_file(self) -> ProjectFile {
        ProjectFile::try_from(self.raw).expect("Failed to build valid project from builder")
    }

    /// Build a session over a [`MockTaskStore`] with a recording telemetry
    /// sink and an event log.
    pub fn build(self) -> TestProject {
        let cfg = self.build_project_file();
        let store = MockTaskStore::new(cfg.project.id.clone(), cfg.tasks(), cfg.dependencies());
        let telemetry = RecordingTelemetrySink::new();
        let events = EventLog::default();

        let collaborators = Collaborators {
            tasks: Arc::new(store.clone()),
            dependencies: Arc::new(store.clone()),
            telemetry: Arc::new(telemetry.clone()),
        };
        let log = events.clone();
        let session = SchedulingSession::from_project_file(&cfg, collaborators)
            .with_notifier(move |event| log.push(event.clone()));

        TestProject {
            cfg,
            store,
            telemetry,
            events,
            session,
        }
    }
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(start_day: i64, end_day: i64) -> Self {
        Self {
            task: TaskConfig {
                start: at(start_day),
                end: at(end_day),
                progress: 0,
            },
        }
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.task.progress = progress;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Shared log of session notifications.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    pub fn push(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Everything a test needs to drive and observe one session.
pub struct TestProject {
    pub cfg: ProjectFile,
    pub store: MockTaskStore,
    pub telemetry: RecordingTelemetrySink,
    pub events: EventLog,
    pub session: SchedulingSession,
}
