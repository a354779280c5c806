// src/store/mock.rs

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::bail;
use tokio::sync::Notify;

use super::{DependencySource, InMemoryProject, StoreFuture, TaskStore};
use crate::dag::{Dependency, Task, TaskId, TaskSchedule};

#[derive(Debug, Default)]
struct FailurePlan {
    /// 1-based call numbers that fail.
    calls: HashSet<usize>,
    /// Tasks whose updates always fail.
    tasks: HashSet<TaskId>,
}

/// Task store for tests.
///
/// Wraps an [`InMemoryProject`] and additionally:
/// - records every successful `update_task` call in order,
/// - fails selected calls (by call number or by task id),
/// - can hold all updates until [`MockTaskStore::resume_updates`] is called.
#[derive(Debug, Clone)]
pub struct MockTaskStore {
    project: InMemoryProject,
    attempts: Arc<Mutex<usize>>,
    calls: Arc<Mutex<Vec<(TaskId, TaskSchedule)>>>,
    failures: Arc<Mutex<FailurePlan>>,
    paused: Arc<AtomicBool>,
    resume: Arc<Notify>,
}

impl MockTaskStore {
    pub fn new(
        project_id: impl Into<String>,
        tasks: impl IntoIterator<Item = Task>,
        dependencies: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        Self::from_project(InMemoryProject::new(project_id, tasks, dependencies))
    }

    pub fn from_project(project: InMemoryProject) -> Self {
        Self {
            project,
            attempts: Arc::new(Mutex::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(FailurePlan::default())),
            paused: Arc::new(AtomicBool::new(false)),
            resume: Arc::new(Notify::new()),
        }
    }

    /// Make the `n`-th `update_task` call (1-based, counted from now on
    /// across the store's lifetime) fail.
    pub fn fail_on_call(&self, n: usize) {
        lock(&self.failures).calls.insert(n);
    }

    /// Make every update of `task_id` fail.
    pub fn fail_for_task(&self, task_id: &str) {
        lock(&self.failures).tasks.insert(task_id.to_string());
    }

    pub fn clear_failures(&self) {
        let mut plan = lock(&self.failures);
        plan.calls.clear();
        plan.tasks.clear();
    }

    /// Hold every update until [`MockTaskStore::resume_updates`].
    pub fn pause_updates(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_updates(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resume.notify_waiters();
    }

    /// Number of `update_task` calls started, including failed and held ones.
    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }

    /// Poll until at least `n` update calls have started.
    pub async fn wait_for_attempts(&self, n: usize) {
        while self.attempts() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Successful updates, in the order they were applied.
    pub fn calls(&self) -> Vec<(TaskId, TaskSchedule)> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn schedule_of(&self, task_id: &str) -> Option<TaskSchedule> {
        self.project.schedule_of(task_id)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.project.tasks()
    }

    async fn wait_while_paused(&self) {
        loop {
            let resumed = self.resume.notified();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            resumed.await;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TaskStore for MockTaskStore {
    fn load_tasks(&self, project_id: &str) -> StoreFuture<'_, Vec<Task>> {
        self.project.load_tasks(project_id)
    }

    fn update_task(&self, task_id: TaskId, schedule: TaskSchedule) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let call = {
                let mut attempts = lock(&self.attempts);
                *attempts += 1;
                *attempts
            };

            self.wait_while_paused().await;

            let fail = {
                let plan = lock(&self.failures);
                plan.calls.contains(&call) || plan.tasks.contains(&task_id)
            };
            if fail {
                bail!("injected failure on update #{call} of task '{task_id}'");
            }

            self.project.update_task(task_id.clone(), schedule).await?;
            lock(&self.calls).push((task_id, schedule));
            Ok(())
        })
    }
}

impl DependencySource for MockTaskStore {
    fn load_dependencies(&self, project_id: &str) -> StoreFuture<'_, Vec<Dependency>> {
        self.project.load_dependencies(project_id)
    }
}
