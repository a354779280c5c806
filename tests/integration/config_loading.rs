// tests/integration/config_loading.rs

use std::fs;
use std::path::PathBuf;

use autosched::config::{cycle_report, load_and_validate, load_from_path};
use autosched::errors::AutoschedError;
use autosched::types::{DependencyType, Lag, LagUnit, ReviewAction};
use tempfile::TempDir;

use crate::common::{TestResult, window};

const VALID: &str = r#"
[project]
id = "launch"

[scheduling]
max_cascading_depth = 3
default_lag = "4h"
on_review = "proceed"

[task.design]
start = "2024-01-01T00:00:00Z"
end = "2024-01-03T00:00:00Z"
progress = 40

[task.build]
start = "2024-01-03T00:00:00Z"
end = "2024-01-06T00:00:00Z"

[task.review]
start = "2024-01-06T00:00:00Z"
end = "2024-01-07T00:00:00Z"

[[dependency]]
from = "design"
to = "build"
lag = "2d"

[[dependency]]
from = "build"
to = "review"
type = "FF"
"#;

fn write_project(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Autosched.toml");
    fs::write(&path, contents).expect("write project file");
    (dir, path)
}

#[test]
fn loads_tasks_dependencies_and_settings() -> TestResult {
    let (_dir, path) = write_project(VALID);
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.project.id, "launch");
    assert_eq!(cfg.scheduling.max_cascading_depth, 3);
    assert_eq!(cfg.scheduling.default_lag, Lag::new(4, LagUnit::Hours)?);
    assert_eq!(cfg.scheduling.on_review, ReviewAction::Proceed);
    // Unset keys keep their defaults.
    assert_eq!(cfg.scheduling.max_history_size, 20);
    assert_eq!(cfg.telemetry.batch_size, 5);

    let tasks = cfg.tasks();
    assert_eq!(tasks.len(), 3);
    let design = tasks.iter().find(|t| t.id == "design").expect("design task");
    assert_eq!(design.schedule, window(1, 3));
    assert_eq!(design.progress, 40);

    let deps = cfg.dependencies();
    assert_eq!(deps[0].kind, DependencyType::FinishToStart);
    assert_eq!(deps[0].lag, Some(Lag::days(2)?));
    assert_eq!(deps[1].kind, DependencyType::FinishToFinish);
    assert_eq!(deps[1].lag, None);
    assert_eq!(deps[1].effective_lag(cfg.scheduling.default_lag), chrono::Duration::hours(4));

    assert!(cycle_report(&cfg).is_none());
    Ok(())
}

#[test]
fn malformed_lag_is_a_parse_error() {
    let (_dir, path) = write_project(&VALID.replace("\"2d\"", "\"2 fortnights\""));
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, AutoschedError::TomlError(_)), "got {err:?}");
}

#[test]
fn unknown_dependency_target_is_rejected() {
    let (_dir, path) = write_project(&VALID.replace("to = \"review\"", "to = \"ship\""));
    let err = load_and_validate(&path).unwrap_err();
    let AutoschedError::ConfigError(msg) = err else {
        panic!("expected ConfigError, got {err:?}");
    };
    assert!(msg.contains("ship"));
}

#[test]
fn zero_history_size_is_rejected() {
    let (_dir, path) = write_project(&VALID.replace(
        "on_review = \"proceed\"",
        "on_review = \"proceed\"\nmax_history_size = 0",
    ));
    assert!(matches!(
        load_and_validate(&path),
        Err(AutoschedError::ConfigError(_))
    ));
}

#[test]
fn cyclic_project_loads_and_is_reported() -> TestResult {
    let cyclic = format!("{VALID}\n[[dependency]]\nfrom = \"review\"\nto = \"design\"\n");
    let (_dir, path) = write_project(&cyclic);

    let cfg = load_and_validate(&path)?;
    let report = cycle_report(&cfg).expect("cycle should be reported");
    assert!(report.contains("cycle"), "report: {report}");
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AutoschedError::IoError(_)));
}
