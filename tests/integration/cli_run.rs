// tests/integration/cli_run.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autosched::cli::CliArgs;
use autosched::engine::HistoryAction;
use autosched_test_utils::telemetry::RecordingTelemetrySink;
use clap::Parser;
use tempfile::TempDir;

use crate::common::init_tracing;

const PROJECT: &str = r#"
[project]
id = "cli"

[task.a]
start = "2024-01-01T00:00:00Z"
end = "2024-01-03T00:00:00Z"

[task.b]
start = "2024-01-03T00:00:00Z"
end = "2024-01-05T00:00:00Z"

[[dependency]]
from = "a"
to = "b"
"#;

fn project_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Autosched.toml");
    fs::write(&path, contents).expect("write project file");
    (dir, path)
}

fn args(path: &Path, extra: &[&str]) -> CliArgs {
    let mut argv = vec!["autosched", "--project", path.to_str().expect("utf-8 path")];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("valid arguments")
}

#[tokio::test]
async fn lists_project_without_a_task() -> anyhow::Result<()> {
    init_tracing();
    let (_dir, path) = project_file(PROJECT);
    autosched::run(args(&path, &[])).await
}

#[tokio::test]
async fn dry_run_leaves_project_file_alone() -> anyhow::Result<()> {
    let (_dir, path) = project_file(PROJECT);
    autosched::run(args(
        &path,
        &["--task", "a", "--move-to", "2024-01-02T00:00:00Z", "--dry-run"],
    ))
    .await?;
    assert_eq!(fs::read_to_string(&path)?, PROJECT);
    Ok(())
}

#[tokio::test]
async fn move_then_undo_runs_to_completion() -> anyhow::Result<()> {
    let (_dir, path) = project_file(PROJECT);
    autosched::run(args(
        &path,
        &["--task", "a", "--move-to", "2024-01-02T00:00:00Z", "--undo"],
    ))
    .await
}

#[tokio::test]
async fn resize_runs_to_completion() -> anyhow::Result<()> {
    let (_dir, path) = project_file(PROJECT);
    autosched::run(args(
        &path,
        &[
            "--task",
            "a",
            "--resize",
            "2024-01-01T00:00:00Z",
            "2024-01-04T00:00:00Z",
        ],
    ))
    .await
}

#[tokio::test]
async fn task_without_gesture_is_an_error() {
    let (_dir, path) = project_file(PROJECT);
    let err = autosched::run(args(&path, &["--task", "a"])).await.unwrap_err();
    assert!(err.to_string().contains("--move-to"));
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    let (_dir, path) = project_file(PROJECT);
    let err = autosched::run(args(
        &path,
        &["--task", "zzz", "--move-to", "2024-01-02T00:00:00Z"],
    ))
    .await
    .unwrap_err();
    assert!(err.to_string().contains("zzz"));
}

#[tokio::test]
async fn failed_gesture_still_reports_its_telemetry() {
    let (_dir, path) = project_file(PROJECT);
    let sink = RecordingTelemetrySink::new();

    let err = autosched::run_with_sink(
        args(
            &path,
            &[
                "--task",
                "b",
                "--resize",
                "2024-01-09T00:00:00Z",
                "2024-01-04T00:00:00Z",
            ],
        ),
        Arc::new(sink.clone()),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Validation"));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert_eq!(records[0].action, HistoryAction::Execute);
    assert!(records[0].error.is_some());
}
