//! Whole sessions against the on-disk store

mod common;

use std::sync::Arc;

use common::{tree_ab, tree_xyz};
use nestcanvas_core::logging_facility::init_test_capture;
use nestcanvas_core::schema::EVENT_TRANSITION;
use nestcanvas_engine::{
    ConsistencyManager, Coordinator, DiagramHost, EngineConfig, LiveDiagram, SaveOutcome,
};
use nestcanvas_store::SqliteStore;

fn session(path: &std::path::Path) -> (Arc<LiveDiagram>, Coordinator) {
    let store = SqliteStore::open(path).unwrap();
    let live = Arc::new(LiveDiagram::new());
    let manager = ConsistencyManager::new(Arc::new(store), live.clone(), EngineConfig::default());
    (live, Coordinator::new(manager))
}

#[tokio::test]
async fn test_diagram_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.db");

    let (live, coordinator) = session(&path);
    live.set_nodes(tree_ab());
    let saved = coordinator.manager().save_now(None).await;
    assert!(matches!(saved, SaveOutcome::Saved { .. }));
    drop(coordinator);

    let (live, coordinator) = session(&path);
    assert!(coordinator.boot().await.unwrap());
    assert_eq!(live.nodes(), tree_ab());
}

#[tokio::test]
async fn test_clear_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.db");

    let (live, coordinator) = session(&path);
    live.set_nodes(tree_xyz());
    coordinator.manager().save_now(None).await;
    coordinator.manager().clear().await;
    drop(coordinator);

    let (live, coordinator) = session(&path);
    assert!(!coordinator.boot().await.unwrap());
    assert!(live.nodes().is_empty());
}

#[tokio::test]
async fn test_restore_logs_each_transition() {
    let capture = init_test_capture();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.db");

    let (live, coordinator) = session(&path);
    live.set_nodes(tree_ab());
    coordinator.manager().save_now(None).await;
    coordinator.restore().await.unwrap();

    let transitions: Vec<String> = capture
        .local_events()
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_TRANSITION))
        .filter_map(|e| e.field("transition").map(str::to_string))
        .collect();
    assert_eq!(transitions, vec!["start_restore", "restore_applying", "complete"]);
    capture.assert_event_exists("restore", "end");
}
