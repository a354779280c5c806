// tests/integration/history.rs

use autosched::engine::{BarMove, BarResize, CommandId, SessionEvent};

use crate::common::{ProjectBuilder, TestProject, at, snapshot};

fn project(max_history: usize) -> TestProject {
    ProjectBuilder::new()
        .max_history_size(max_history)
        .task("P", 1, 3)
        .task("S", 3, 6)
        .task("L", 1, 2)
        .fs("P", "S")
        .build()
}

async fn move_task(p: &TestProject, id: &str, day: i64) {
    p.session
        .execute_bar_move(BarMove {
            task_id: id.into(),
            new_start: at(day),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn undo_then_redo_restores_the_same_windows() {
    let p = project(20);
    let original = snapshot(&p.store);

    move_task(&p, "P", 4).await;
    p.session
        .execute_bar_resize(BarResize {
            task_id: "P".into(),
            new_start: at(4),
            new_end: at(9),
        })
        .await
        .unwrap();
    move_task(&p, "L", 10).await;
    let executed = snapshot(&p.store);

    for _ in 0..3 {
        assert!(p.session.undo().await.unwrap());
    }
    assert_eq!(snapshot(&p.store), original);
    assert!(!p.session.can_undo());

    for _ in 0..3 {
        assert!(p.session.redo().await.unwrap());
    }
    assert_eq!(snapshot(&p.store), executed);
    assert!(!p.session.can_redo());
}

#[tokio::test]
async fn history_keeps_only_the_most_recent_entries() {
    let p = project(3);
    for day in 2..=6 {
        move_task(&p, "L", day).await;
    }

    assert_eq!(p.session.history_count().await, 3);
    assert_eq!(p.session.current_index().await, Some(2));
    let ids: Vec<CommandId> = p
        .session
        .history_entries()
        .await
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![CommandId(3), CommandId(4), CommandId(5)]);
}

#[tokio::test]
async fn new_command_after_undo_discards_redo() {
    let p = project(20);
    move_task(&p, "L", 2).await; // A
    move_task(&p, "L", 3).await; // B
    move_task(&p, "L", 4).await; // C

    assert!(p.session.undo().await.unwrap());
    assert_eq!(p.session.current_index().await, Some(1));
    assert!(p.session.can_redo());

    move_task(&p, "L", 8).await; // D
    assert!(!p.session.can_redo());
    assert!(!p.session.redo().await.unwrap());

    let descriptions: Vec<String> = p
        .session
        .history_entries()
        .await
        .into_iter()
        .map(|e| e.description)
        .collect();
    assert_eq!(descriptions.len(), 3);
    assert!(descriptions[2].contains("Move task L"));
    assert_eq!(p.store.schedule_of("L").map(|s| s.start), Some(at(8)));
}

#[tokio::test]
async fn clear_history_empties_and_notifies() {
    let p = project(20);
    move_task(&p, "P", 4).await;
    p.events.clear();

    p.session.clear_history().await;

    assert_eq!(p.session.history_count().await, 0);
    assert!(!p.session.can_undo());
    assert_eq!(
        p.events.events(),
        vec![SessionEvent::HistoryChanged {
            history_count: 0,
            current_index: None,
            can_undo: false,
            can_redo: false,
        }]
    );
}
