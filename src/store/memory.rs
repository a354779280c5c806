// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, bail};
use tracing::debug;

use super::{DependencySource, StoreFuture, TaskStore};
use crate::config::ProjectFile;
use crate::dag::{Dependency, Task, TaskId, TaskSchedule};

/// In-memory system of record for one project.
///
/// Cloning shares the underlying task map, so a clone handed to a session
/// observes the same writes as the original.
#[derive(Debug, Clone)]
pub struct InMemoryProject {
    project_id: String,
    tasks: Arc<Mutex<BTreeMap<TaskId, Task>>>,
    dependencies: Arc<Vec<Dependency>>,
}

impl InMemoryProject {
    pub fn new(
        project_id: impl Into<String>,
        tasks: impl IntoIterator<Item = Task>,
        dependencies: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        let tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            project_id: project_id.into(),
            tasks: Arc::new(Mutex::new(tasks)),
            dependencies: Arc::new(dependencies.into_iter().collect()),
        }
    }

    /// Seed a store from a validated project file.
    pub fn from_project_file(cfg: &ProjectFile) -> Self {
        Self::new(cfg.project.id.clone(), cfg.tasks(), cfg.dependencies())
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Current tasks, ordered by id.
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().values().cloned().collect()
    }

    pub fn schedule_of(&self, task_id: &str) -> Option<TaskSchedule> {
        self.lock().get(task_id).map(|t| t.schedule)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<TaskId, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_project(&self, project_id: &str) -> anyhow::Result<()> {
        if project_id != self.project_id {
            bail!(
                "unknown project '{}' (store holds '{}')",
                project_id,
                self.project_id
            );
        }
        Ok(())
    }
}

impl TaskStore for InMemoryProject {
    fn load_tasks(&self, project_id: &str) -> StoreFuture<'_, Vec<Task>> {
        let checked = self.check_project(project_id);
        Box::pin(async move {
            checked?;
            Ok(self.tasks())
        })
    }

    fn update_task(&self, task_id: TaskId, schedule: TaskSchedule) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tasks = self.lock();
            let task = tasks
                .get_mut(&task_id)
                .ok_or_else(|| anyhow!("task '{}' not found", task_id))?;
            debug!(task = %task_id, schedule = %schedule, "task window updated");
            task.schedule = schedule;
            Ok(())
        })
    }
}

impl DependencySource for InMemoryProject {
    fn load_dependencies(&self, project_id: &str) -> StoreFuture<'_, Vec<Dependency>> {
        let checked = self.check_project(project_id);
        let deps = Arc::clone(&self.dependencies);
        Box::pin(async move {
            checked?;
            Ok(deps.as_ref().clone())
        })
    }
}
