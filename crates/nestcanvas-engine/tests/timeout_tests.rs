mod common;

use std::time::Duration;

use common::{harness_with, record, snapshot_value, tree_ab, T};
use nestcanvas_core::errors::ExErrorKind;
use nestcanvas_core::operation::OperationState;
use nestcanvas_engine::{EngineConfig, SaveOutcome};

fn config(storage_timeout_ms: u64) -> EngineConfig {
    EngineConfig {
        storage_timeout_ms,
        ..EngineConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_read_abandons_restore() {
    let h = harness_with(config(100));
    h.store.inject(record(tree_ab(), T));
    h.store.set_latency(Some(Duration::from_secs(30)));

    let err = h.manager.restore().await.unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Timeout);
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
    assert_eq!(h.live.apply_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hung_write_reports_timed_out() {
    let h = harness_with(config(100));
    h.store.set_latency(Some(Duration::from_secs(30)));

    let outcome = h.manager.save_now(Some(tree_ab())).await;

    assert_eq!(outcome, SaveOutcome::TimedOut);
    assert_eq!(h.manager.last_saved(), None);
    assert!(h.manager.last_known_good().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_hung_apply_abandons_import() {
    let h = harness_with(config(100));
    h.live.set_apply_delay(Some(Duration::from_secs(30)));

    let bytes = serde_json::to_vec(&snapshot_value(tree_ab(), T)).unwrap();
    let err = h.coordinator.import_bytes(&bytes).await.unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Timeout);
    assert!(h.manager.is_auto_save_enabled());
    assert_eq!(h.manager.operation_state(), OperationState::Idle);
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_waits_indefinitely() {
    let h = harness_with(config(0));
    h.store.set_latency(Some(Duration::from_secs(30)));

    assert!(h.manager.save_now(Some(tree_ab())).await.is_saved());
}
