// src/dag/mod.rs

//! Dependency graph and cascade scheduling.
//!
//! - [`task`] holds task windows, dependency edges and proposed updates.
//! - [`graph`] is the read-only snapshot answering adjacency and
//!   reachability queries.
//! - [`traversal`] is the bounded walk shared by scheduler and analyzer.
//! - [`scheduler`] computes the derived updates for one edited task.
//! - [`cascade_plan`] defines the scheduler's result type.
//! - [`impact`] predicts the blast radius before anything runs.

pub mod cascade_plan;
pub mod graph;
pub mod impact;
pub mod scheduler;
pub mod task;
pub mod traversal;

pub use cascade_plan::CascadePlan;
pub use graph::DependencyGraph;
pub use impact::{ImpactAnalysis, ImpactAnalyzer, ImpactPolicy, Recommendation};
pub use scheduler::{Scheduler, SchedulingOptions};
pub use task::{Dependency, Task, TaskId, TaskSchedule, TaskUpdate};
pub use traversal::{CascadeWalk, walk_cascade};
