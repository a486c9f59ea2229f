mod common;

use std::time::Duration;

use common::{harness, record, tree_ab, T};
use nestcanvas_engine::{DiagramHost, RestoreOutcome};

#[tokio::test(start_paused = true)]
async fn test_empty_storage_restores_nothing() {
    let h = harness();
    assert!(!h.coordinator.boot().await.unwrap());
    assert!(h.live.nodes().is_empty());
    assert_eq!(h.live.apply_count(), 0);
    assert!(!h.manager.has_saved_data());
}

#[tokio::test(start_paused = true)]
async fn test_auto_restore_runs_once_per_session() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));

    assert!(h.coordinator.boot().await.unwrap());
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!h.coordinator.boot().await.unwrap());

    assert_eq!(h.live.apply_count(), 1);
    assert_eq!(h.store.read_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_boot_paths_restore_once() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    h.store.set_latency(Some(Duration::from_millis(100)));

    let (first, second) = tokio::join!(h.coordinator.boot(), h.manager.check_and_auto_restore());

    assert_ne!(first.unwrap(), second.unwrap());
    assert_eq!(h.live.apply_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_boot_does_not_latch() {
    let h = harness();
    assert!(!h.coordinator.boot().await.unwrap());

    h.store.inject(record(tree_ab(), T));
    assert!(h.coordinator.boot().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_clear_forgets_everything_and_rearms() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    assert!(h.coordinator.boot().await.unwrap());

    h.manager.clear().await;

    assert!(h.store.current().is_none());
    assert!(h.manager.last_known_good().is_none());
    assert!(!h.manager.has_saved_data());
    assert_eq!(h.manager.last_saved(), None);

    tokio::time::sleep(Duration::from_millis(300)).await;
    h.store.inject(record(tree_ab(), T + 1));
    assert!(h.coordinator.boot().await.unwrap());
    assert_eq!(h.live.apply_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cleared_diagram_is_not_resurrected_on_boot() {
    let h = harness();
    h.manager.clear().await;
    assert!(h.manager.save_now(Some(Vec::new())).await.is_saved());
    assert!(h.store.current().unwrap().cleared);

    assert!(!h.coordinator.boot().await.unwrap());
    assert_eq!(h.live.apply_count(), 0);

    // an explicit restore still loads it
    let outcome = h.coordinator.restore().await.unwrap();
    assert!(matches!(outcome, RestoreOutcome::Restored { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_content_after_clear_is_restored_normally() {
    let h = harness();
    h.manager.clear().await;
    h.manager.save_now(Some(tree_ab())).await;
    assert!(!h.store.current().unwrap().cleared);

    assert!(h.coordinator.boot().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_storage_boots_empty() {
    let h = harness();
    h.store.set_available(false);

    assert!(!h.coordinator.boot().await.unwrap());
    assert!(!h.manager.has_saved_data());
    assert_eq!(h.live.apply_count(), 0);
}
