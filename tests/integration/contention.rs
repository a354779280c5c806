// tests/integration/contention.rs

use std::sync::Arc;

use autosched::engine::{BarMove, SchedulingSession};
use autosched::errors::AutoschedError;

use crate::common::{ProjectBuilder, TestResult, at, window, with_timeout};

fn move_to(task: &str, day: i64) -> BarMove {
    BarMove {
        task_id: task.into(),
        new_start: at(day),
    }
}

#[tokio::test]
async fn second_gesture_is_refused_while_first_is_writing() -> TestResult {
    let p = ProjectBuilder::new()
        .task("P", 1, 3)
        .task("S", 3, 5)
        .task("L", 1, 2)
        .fs("P", "S")
        .build();
    let store = p.store.clone();
    let session: Arc<SchedulingSession> = Arc::new(p.session);

    store.pause_updates();
    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.execute_bar_move(move_to("P", 2)).await })
    };
    with_timeout(store.wait_for_attempts(1)).await;

    let err = session.execute_bar_move(move_to("L", 5)).await.unwrap_err();
    assert!(matches!(err, AutoschedError::HistoryBusy(_)));
    assert!(!session.undo().await?);
    assert!(!session.redo().await?);
    assert!(!session.can_undo());
    assert!(!session.can_redo());

    store.resume_updates();
    let outcome = with_timeout(first).await??;
    assert!(outcome.auto_scheduled);

    // The refused gesture never reached the store.
    assert_eq!(store.attempts(), 2);
    assert_eq!(store.schedule_of("L"), Some(window(1, 2)));
    assert_eq!(store.schedule_of("S"), Some(window(4, 6)));
    assert_eq!(session.history_count().await, 1);
    assert!(session.can_undo());
    Ok(())
}

#[tokio::test]
async fn undo_in_flight_blocks_new_gestures() -> TestResult {
    let p = ProjectBuilder::new().task("L", 1, 2).build();
    let store = p.store.clone();
    let session = Arc::new(p.session);

    session.execute_bar_move(move_to("L", 4)).await?;

    store.pause_updates();
    let undo = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.undo().await })
    };
    with_timeout(store.wait_for_attempts(2)).await;

    let err = session.execute_bar_move(move_to("L", 9)).await.unwrap_err();
    assert!(matches!(err, AutoschedError::HistoryBusy(_)));

    store.resume_updates();
    assert!(with_timeout(undo).await??);
    assert_eq!(store.schedule_of("L"), Some(window(1, 2)));
    assert!(session.can_redo());
    Ok(())
}
