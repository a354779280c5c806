#![allow(dead_code)]

pub use autosched_test_utils::builders::{ProjectBuilder, TaskConfigBuilder, TestProject};
pub use autosched_test_utils::{at, init_tracing, with_timeout};

use autosched::dag::TaskSchedule;
use autosched::store::MockTaskStore;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn window(start_day: i64, end_day: i64) -> TaskSchedule {
    TaskSchedule::new(at(start_day), at(end_day))
}

/// Current window of every task, sorted by id.
pub fn snapshot(store: &MockTaskStore) -> Vec<(String, TaskSchedule)> {
    store
        .tasks()
        .into_iter()
        .map(|t| (t.id, t.schedule))
        .collect()
}
