// tests/integration/gating.rs

use autosched::dag::Recommendation;
use autosched::engine::{BarMove, Gesture, SessionEvent};
use autosched::errors::AutoschedError;
use autosched::types::ReviewAction;

use crate::common::{ProjectBuilder, TestProject, TestResult, at, snapshot, window};

fn cyclic() -> TestProject {
    ProjectBuilder::new()
        .task("A", 1, 3)
        .task("B", 3, 5)
        .task("C", 5, 7)
        .fs("A", "B")
        .fs("B", "C")
        .fs("C", "A")
        .build()
}

/// Root with `n` direct dependents, all packed against it.
fn star(n: usize) -> ProjectBuilder {
    let mut b = ProjectBuilder::new().task("R", 1, 3);
    for i in 0..n {
        let id = format!("D{i}");
        b = b.task(&id, 3, 4).fs("R", &id);
    }
    b
}

#[tokio::test]
async fn cycle_is_reported_and_nothing_is_written() {
    let p = cyclic();
    let before = snapshot(&p.store);

    let impact = p.session.analyze_impact("A").await.unwrap();
    assert!(impact.has_cycle);
    assert_eq!(impact.recommendation, Recommendation::Abort);

    let err = p
        .session
        .execute_bar_move(BarMove {
            task_id: "A".into(),
            new_start: at(2),
        })
        .await
        .unwrap_err();

    let AutoschedError::CycleDetected { path } = err else {
        panic!("expected CycleDetected, got {err:?}");
    };
    assert_eq!(path.first(), path.last());
    assert!(path.contains(&"B".to_string()) && path.contains(&"C".to_string()));

    assert_eq!(p.store.attempts(), 0);
    assert_eq!(snapshot(&p.store), before);
    assert_eq!(p.session.history_count().await, 0);
    assert!(p
        .events
        .events()
        .iter()
        .any(|e| matches!(e, SessionEvent::CycleAborted { task_id, .. } if task_id == "A")));
}

#[tokio::test]
async fn self_loop_is_refused() {
    let p = ProjectBuilder::new().task("A", 1, 3).fs("A", "A").build();
    let err = p
        .session
        .execute_bar_move(BarMove {
            task_id: "A".into(),
            new_start: at(2),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AutoschedError::CycleDetected { .. }));
    assert_eq!(p.store.attempts(), 0);
}

#[tokio::test]
async fn too_many_dependents_is_refused_for_review() {
    let p = star(3).max_affected_tasks(2).build();

    let err = p
        .session
        .execute_bar_move(BarMove {
            task_id: "R".into(),
            new_start: at(2),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AutoschedError::ThresholdExceeded {
            affected: 3,
            recommendation: Recommendation::Review,
            ..
        }
    ));
    assert_eq!(p.store.attempts(), 0);
    assert!(p.events.events().iter().any(|e| matches!(
        e,
        SessionEvent::ReviewRequired { proceeding: false, .. }
    )));
}

#[tokio::test]
async fn slow_estimate_can_be_accepted_by_configuration() -> TestResult {
    // 10ms + 3 * 20ms = 70ms against a 50ms budget.
    let p = star(3)
        .performance_threshold_ms(50.0)
        .on_review(ReviewAction::Proceed)
        .build();

    let outcome = p
        .session
        .execute_bar_move(BarMove {
            task_id: "R".into(),
            new_start: at(2),
        })
        .await?;

    let impact = outcome.impact.expect("impact analysis ran");
    assert_eq!(impact.recommendation, Recommendation::Review);
    assert_eq!(impact.estimated_affected_tasks, 3);
    assert!(outcome.auto_scheduled);
    for i in 0..3 {
        assert_eq!(p.store.schedule_of(&format!("D{i}")), Some(window(4, 5)));
    }
    assert!(p.events.events().iter().any(|e| matches!(
        e,
        SessionEvent::ReviewRequired { proceeding: true, .. }
    )));
    Ok(())
}

#[tokio::test]
async fn leaf_task_skips_analysis() -> TestResult {
    let p = star(1).build();
    let impact = p.session.analyze_impact("D0").await?;
    assert!(!impact.will_trigger);
    assert_eq!(impact.estimated_affected_tasks, 0);
    assert_eq!(impact.recommendation, Recommendation::Proceed);

    let outcome = p
        .session
        .execute_bar_move(BarMove {
            task_id: "D0".into(),
            new_start: at(6),
        })
        .await?;
    assert!(!outcome.auto_scheduled);
    assert!(outcome.impact.is_none());
    Ok(())
}

#[tokio::test]
async fn preview_does_not_write() -> TestResult {
    let p = star(2).build();
    let preview = p
        .session
        .preview(&Gesture::Move(BarMove {
            task_id: "R".into(),
            new_start: at(2),
        }))
        .await?;

    assert_eq!(preview.proposed, window(2, 4));
    let plan = preview.plan.expect("acyclic plan");
    assert_eq!(plan.updates.len(), 2);
    assert_eq!(p.store.attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_gestures_are_rejected() {
    let p = star(1).build();

    let err = p
        .session
        .execute_bar_move(BarMove {
            task_id: "nope".into(),
            new_start: at(2),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AutoschedError::TaskNotFound(id) if id == "nope"));

    let err = p
        .session
        .execute_bar_resize(autosched::engine::BarResize {
            task_id: "D0".into(),
            new_start: at(9),
            new_end: at(2),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AutoschedError::Validation(_)));
    assert_eq!(p.store.attempts(), 0);
    assert_eq!(p.session.history_count().await, 0);
}
