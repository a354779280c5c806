// src/store/mod.rs

//! Collaborator interfaces to the system of record.
//!
//! The engine never owns task data. It reads a snapshot through
//! [`TaskStore::load_tasks`] and [`DependencySource::load_dependencies`] and
//! proposes new windows through [`TaskStore::update_task`].
//!
//! - [`memory`] provides [`InMemoryProject`], the store used by the CLI.
//! - [`mock`] provides [`MockTaskStore`], which records calls and can inject
//!   failures or hold updates, for tests.
//!
//! The telemetry collaborator lives with the buffer that feeds it, in
//! [`crate::engine::telemetry`], and is re-exported here.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::dag::{Dependency, Task, TaskId, TaskSchedule};

pub mod memory;
pub mod mock;

pub use memory::InMemoryProject;
pub use mock::MockTaskStore;

pub use crate::engine::telemetry::{TelemetrySink, TracingTelemetrySink};

/// Boxed future returned by collaborator calls.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Persistence collaborator for task windows.
pub trait TaskStore: Send + Sync + Debug {
    /// Point-in-time read of every task in the project.
    fn load_tasks(&self, project_id: &str) -> StoreFuture<'_, Vec<Task>>;

    /// Apply one task's window. Called once per affected task per command
    /// run, and again with the previous window to undo.
    fn update_task(&self, task_id: TaskId, schedule: TaskSchedule) -> StoreFuture<'_, ()>;
}

/// Source of the project's dependency edges.
pub trait DependencySource: Send + Sync + Debug {
    fn load_dependencies(&self, project_id: &str) -> StoreFuture<'_, Vec<Dependency>>;
}
