mod common;

use std::time::Duration;

use common::{harness, ids, record, snapshot_value, stored_ids, tree_ab, tree_xyz, T};
use nestcanvas_core::errors::ExErrorKind;
use nestcanvas_core::operation::{LockReason, OperationEvent, OperationState};
use nestcanvas_engine::{DiagramHost, RestoreOutcome, SaveOutcome};
use nestcanvas_store::DiagramRecord;

#[tokio::test(start_paused = true)]
async fn test_restore_applies_stored_diagram() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));

    let outcome = h.manager.restore().await.unwrap();

    assert_eq!(outcome, RestoreOutcome::Restored { timestamp: T });
    assert_eq!(ids(&h.live.nodes()), vec!["A", "B"]);
    assert_eq!(h.live.nodes()[1].parent_id.as_deref(), Some("A"));
    assert_eq!(h.manager.last_saved(), Some(T));
    assert_eq!(h.manager.last_good_save(), Some(T));
    assert!(h.manager.has_saved_data());
    assert_eq!(h.live.history_generation(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_save_then_restore_round_trip() {
    let h = harness();
    h.live.set_nodes(tree_ab());
    assert!(h.manager.save_now(None).await.is_saved());

    h.live.set_nodes(Vec::new());
    let outcome = h.manager.restore().await.unwrap();

    assert!(matches!(outcome, RestoreOutcome::Restored { .. }));
    assert_eq!(h.live.nodes(), tree_ab());
}

#[tokio::test(start_paused = true)]
async fn test_restore_locks_layout_then_settles() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    h.manager.restore().await.unwrap();

    assert_eq!(
        h.manager.operation_state(),
        OperationState::LayoutLocked(LockReason::Restore)
    );
    assert!(!h.manager.can_reflow_now());

    tokio::time::sleep(Duration::from_millis(251)).await;
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
    assert!(h.manager.can_reflow_now());
}

#[tokio::test(start_paused = true)]
async fn test_restore_during_import_is_a_no_op() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    h.manager.machine().dispatch(OperationEvent::StartImport);

    let outcome = h.manager.restore().await.unwrap();

    assert_eq!(outcome, RestoreOutcome::Busy);
    assert_eq!(h.store.read_count(), 0);
    assert_eq!(h.live.apply_count(), 0);
    assert!(h.live.nodes().is_empty());
    assert!(h.manager.operation_state().is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_empty_storage_reports_no_data() {
    let h = harness();
    let outcome = h.manager.restore().await.unwrap();
    assert_eq!(outcome, RestoreOutcome::NoData);
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
    assert_eq!(h.live.apply_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_format_rolls_back_to_last_good() {
    let h = harness();
    h.live.set_nodes(tree_ab());
    let saved_at = match h.manager.save_now(None).await {
        SaveOutcome::Saved { timestamp } => timestamp,
        other => panic!("unexpected {:?}", other),
    };

    let mut legacy = snapshot_value(tree_xyz(), T);
    legacy["formatVersion"] = "legacy/0".into();
    h.store.inject(DiagramRecord::new(legacy.to_string(), T));
    h.live.set_nodes(tree_xyz());

    let outcome = h.manager.restore().await.unwrap();

    assert_eq!(outcome, RestoreOutcome::RolledBack { timestamp: saved_at });
    assert_eq!(h.live.nodes(), tree_ab());
    // last-known-good is canonical again
    assert_eq!(stored_ids(&h.store), vec!["A", "B"]);
    assert_eq!(h.manager.last_saved(), Some(saved_at));
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_without_last_good_is_an_error() {
    let h = harness();
    h.store.inject(DiagramRecord::new("{ not json", T));

    let err = h.manager.restore().await.unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::CorruptSnapshot);
    assert!(!err.details().is_empty());
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
    assert_eq!(h.live.apply_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tampered_record_is_treated_as_corrupt() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    h.store.tamper(snapshot_value(tree_xyz(), T).to_string());

    let err = h.manager.restore().await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::CorruptSnapshot);
    assert!(err.details()[0].contains("digest"));
    assert!(h.live.nodes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_graph_in_storage_is_corrupt() {
    let h = harness();
    let mut nodes = tree_ab();
    nodes[1].parent_id = Some("B".to_string());
    h.store.inject(record(nodes, T));

    let err = h.manager.restore().await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::CorruptSnapshot);
    assert!(err.details().iter().any(|d| d.contains("own parent")));
}

#[tokio::test(start_paused = true)]
async fn test_apply_failure_abandons_restore() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    h.live.fail_next_apply("canvas detached");

    let err = h.manager.restore().await.unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Collaborator);
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
    assert_eq!(h.manager.last_saved(), None);
    assert!(h.live.nodes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restore_cancels_pending_save() {
    let h = harness();
    h.store.inject(record(tree_ab(), T));
    h.live.set_nodes(tree_xyz());
    h.manager.save(None);

    h.manager.restore().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.store.write_count(), 0);
    assert_eq!(stored_ids(&h.store), vec!["A", "B"]);
}

#[tokio::test(start_paused = true)]
async fn test_rollback_without_last_good() {
    let h = harness();
    assert!(!h.manager.rollback_to_last_good().await.unwrap());
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_rollback_reapplies_and_writes_back() {
    let h = harness();
    h.live.set_nodes(tree_ab());
    h.manager.save_now(None).await;
    h.live.set_nodes(tree_xyz());
    h.store.tamper("garbage");

    assert!(h.manager.rollback_to_last_good().await.unwrap());

    assert_eq!(h.live.nodes(), tree_ab());
    assert_eq!(stored_ids(&h.store), vec!["A", "B"]);
    assert_eq!(
        h.manager.operation_state(),
        OperationState::LayoutLocked(LockReason::Restore)
    );
}

#[tokio::test(start_paused = true)]
async fn test_restore_keeps_settings_and_layout() {
    let h = harness();
    let mut value = snapshot_value(tree_ab(), T);
    value["settings"]["gridSize"] = 32.into();
    value["layoutMetadata"]["isUserArranged"] = true.into();
    h.store.inject(DiagramRecord::new(value.to_string(), T));

    h.manager.restore().await.unwrap();

    assert_eq!(h.live.settings().grid_size, 32.0);
    assert!(h.live.layout_metadata().is_user_arranged);
}
