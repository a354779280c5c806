// tests/integration/cascade.rs

use std::collections::BTreeSet;

use autosched::engine::{BarMove, BarResize, SessionEvent};
use autosched::types::{DependencyType, Lag};

use crate::common::{ProjectBuilder, TestResult, at, init_tracing, window};

#[tokio::test]
async fn finish_to_start_lag_moves_successor_and_keeps_duration() -> TestResult {
    init_tracing();
    let p = ProjectBuilder::new()
        .task("P", 1, 4)
        .task("S", 5, 8)
        .dep_with_lag("P", "S", DependencyType::FinishToStart, Lag::days(2)?)
        .build();

    // P becomes Jan 7 - Jan 10.
    let outcome = p
        .session
        .execute_bar_move(BarMove {
            task_id: "P".into(),
            new_start: at(7),
        })
        .await?;

    assert!(outcome.auto_scheduled);
    assert_eq!(outcome.affected_task_ids, vec!["P", "S"]);
    assert_eq!(p.store.schedule_of("P"), Some(window(7, 10)));
    assert_eq!(p.store.schedule_of("S"), Some(window(12, 15)));
    Ok(())
}

#[tokio::test]
async fn chain_beyond_depth_limit_is_reported_and_left_alone() -> TestResult {
    init_tracing();
    let mut builder = ProjectBuilder::new().max_cascading_depth(5).task("R", 1, 3);
    for i in 1..=10i64 {
        let start = 3 + 2 * (i - 1);
        builder = builder.task(&format!("T{i}"), start, start + 2);
        let pred = if i == 1 { "R".to_string() } else { format!("T{}", i - 1) };
        builder = builder.fs(&pred, &format!("T{i}"));
    }
    let p = builder.build();

    let outcome = p
        .session
        .execute_bar_move(BarMove {
            task_id: "R".into(),
            new_start: at(2),
        })
        .await?;

    for i in 1..=5i64 {
        let start = 3 + 2 * (i - 1);
        assert_eq!(
            p.store.schedule_of(&format!("T{i}")),
            Some(window(start + 1, start + 3)),
            "T{i} should move one day"
        );
    }
    for i in 6..=10i64 {
        let start = 3 + 2 * (i - 1);
        assert_eq!(
            p.store.schedule_of(&format!("T{i}")),
            Some(window(start, start + 2)),
            "T{i} should be untouched"
        );
    }

    let truncated: BTreeSet<_> = outcome.truncated_task_ids.iter().cloned().collect();
    let expected: BTreeSet<_> = (6..=10).map(|i| format!("T{i}")).collect();
    assert_eq!(truncated, expected);
    assert!(p.events.events().iter().any(|e| matches!(
        e,
        SessionEvent::CascadeTruncated { task_id, truncated }
            if task_id == "R" && truncated.len() == 5
    )));
    Ok(())
}

#[tokio::test]
async fn successor_with_slack_does_not_move() -> TestResult {
    let p = ProjectBuilder::new()
        .task("P", 1, 3)
        .task("S", 10, 12)
        .fs("P", "S")
        .build();

    // Later, but still before S starts.
    let later = p
        .session
        .execute_bar_move(BarMove {
            task_id: "P".into(),
            new_start: at(5),
        })
        .await?;
    assert!(!later.auto_scheduled);
    assert_eq!(p.store.schedule_of("S"), Some(window(10, 12)));

    // Earlier: S keeps its slack rather than being pulled back.
    p.session
        .execute_bar_move(BarMove {
            task_id: "P".into(),
            new_start: at(1),
        })
        .await?;
    assert_eq!(p.store.schedule_of("S"), Some(window(10, 12)));
    Ok(())
}

#[tokio::test]
async fn fan_in_uses_the_latest_requirement() -> TestResult {
    // R feeds A and B, both feed S. B is longer, so B decides where S goes
    // no matter which edge is processed first.
    let p = ProjectBuilder::new()
        .task("R", 1, 2)
        .task("A", 2, 4)
        .task("B", 2, 6)
        .task("S", 6, 8)
        .fs("R", "A")
        .fs("R", "B")
        .fs("A", "S")
        .fs("B", "S")
        .build();

    let outcome = p
        .session
        .execute_bar_move(BarMove {
            task_id: "R".into(),
            new_start: at(3),
        })
        .await?;

    assert_eq!(p.store.schedule_of("A"), Some(window(4, 6)));
    assert_eq!(p.store.schedule_of("B"), Some(window(4, 8)));
    assert_eq!(p.store.schedule_of("S"), Some(window(8, 10)));
    assert_eq!(outcome.affected_task_ids.last().map(String::as_str), Some("S"));
    Ok(())
}

#[tokio::test]
async fn resize_end_drives_finish_to_finish_successor() -> TestResult {
    let p = ProjectBuilder::new()
        .task("P", 1, 5)
        .task("S", 2, 5)
        .dep("P", "S", DependencyType::FinishToFinish)
        .build();

    let outcome = p
        .session
        .execute_bar_resize(BarResize {
            task_id: "P".into(),
            new_start: at(1),
            new_end: at(8),
        })
        .await?;

    assert!(outcome.auto_scheduled);
    assert_eq!(p.store.schedule_of("P"), Some(window(1, 8)));
    assert_eq!(p.store.schedule_of("S"), Some(window(5, 8)));
    Ok(())
}

#[tokio::test]
async fn disabled_auto_scheduling_falls_back_to_plain_edit() -> TestResult {
    let p = ProjectBuilder::new()
        .enabled(false)
        .task("P", 1, 3)
        .task("S", 3, 5)
        .fs("P", "S")
        .build();

    let outcome = p
        .session
        .execute_bar_move(BarMove {
            task_id: "P".into(),
            new_start: at(4),
        })
        .await?;

    assert!(!outcome.auto_scheduled);
    assert!(outcome.impact.is_none());
    assert_eq!(outcome.affected_task_ids, vec!["P"]);
    assert_eq!(p.store.schedule_of("S"), Some(window(3, 5)));
    Ok(())
}
