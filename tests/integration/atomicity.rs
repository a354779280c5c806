// tests/integration/atomicity.rs

use autosched::engine::{BarMove, HistoryAction, SessionEvent};
use autosched::errors::AutoschedError;

use crate::common::{ProjectBuilder, TestProject, at, init_tracing, snapshot, window};

/// P -> A -> B -> C, packed back to back.
fn chain() -> TestProject {
    ProjectBuilder::new()
        .task("P", 1, 3)
        .task("A", 3, 5)
        .task("B", 5, 7)
        .task("C", 7, 9)
        .fs("P", "A")
        .fs("A", "B")
        .fs("B", "C")
        .build()
}

fn move_p(day: i64) -> BarMove {
    BarMove {
        task_id: "P".into(),
        new_start: at(day),
    }
}

#[tokio::test]
async fn failure_on_third_write_rolls_back_everything() {
    init_tracing();
    let p = chain();
    let before = snapshot(&p.store);
    p.store.fail_on_call(3);

    let err = p.session.execute_bar_move(move_p(2)).await.unwrap_err();

    assert!(matches!(err, AutoschedError::Collaborator { ref task, .. } if task == "B"));
    assert_eq!(snapshot(&p.store), before);
    // Three forward writes, two compensating writes.
    assert_eq!(p.store.attempts(), 5);
    assert_eq!(p.session.history_count().await, 0);
    assert!(!p.session.can_undo());
    assert!(p.events.events().iter().any(|e| matches!(
        e,
        SessionEvent::CommandFailed {
            action: HistoryAction::Execute,
            task_id: Some(id),
            ..
        } if id == "P"
    )));
}

#[tokio::test]
async fn history_still_works_after_a_rolled_back_gesture() {
    let p = chain();
    p.store.fail_on_call(2);
    assert!(p.session.execute_bar_move(move_p(2)).await.is_err());

    p.store.clear_failures();
    p.session.execute_bar_move(move_p(2)).await.unwrap();
    assert_eq!(p.store.schedule_of("C"), Some(window(8, 10)));
    assert_eq!(p.session.history_count().await, 1);
}

#[tokio::test]
async fn failed_undo_is_compensated_and_can_be_retried() {
    let p = chain();
    let before = snapshot(&p.store);
    p.session.execute_bar_move(move_p(2)).await.unwrap();
    let after = snapshot(&p.store);
    assert_eq!(p.store.attempts(), 4);

    // Undo writes C (call 5), then B (call 6) fails; C is re-applied.
    p.store.fail_on_call(6);
    assert!(p.session.undo().await.is_err());
    assert_eq!(snapshot(&p.store), after);
    assert!(p.session.can_undo());
    assert_eq!(p.session.current_index().await, Some(0));

    assert!(p.session.undo().await.unwrap());
    assert_eq!(snapshot(&p.store), before);
}

#[tokio::test]
async fn failed_compensation_leaves_command_out_of_reach() {
    let p = chain();
    p.session.execute_bar_move(move_p(2)).await.unwrap();

    // Undo: call 5 (C) ok, call 6 (B) fails, compensation call 7 (C) fails.
    p.store.fail_on_call(6);
    p.store.fail_on_call(7);
    assert!(p.session.undo().await.is_err());
    assert!(!p.session.can_undo());
    assert!(!p.session.undo().await.unwrap());
}
