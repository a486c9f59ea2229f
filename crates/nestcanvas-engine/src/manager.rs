//! Consistency manager
//!
//! Owns the durable record and the in-memory last-known-good snapshot. Every
//! save and restore funnels through here, gated by the operation state
//! machine.
//!
//! ## Logging
//!
//! Public operations log one `log_op_start!` and one `log_op_end!` or
//! `log_op_error!`. Degraded storage and skipped saves are `warn`; the
//! reasons a debounced save did nothing are `debug`.

#![allow(clippy::result_large_err)]

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use nestcanvas_core::errors::{ExError, ExErrorKind, Result};
use nestcanvas_core::model::{DiagramSnapshot, Node};
use nestcanvas_core::operation::{OperationEvent, OperationState};
use nestcanvas_core::rules::{validate_snapshot, validate_value};
use nestcanvas_core::{log_op_end, log_op_error, log_op_start};
use nestcanvas_store::{DiagramRecord, DurableStore, StoredRecord};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::host::DiagramHost;
use crate::operation_state::OperationStateMachine;

/// What a save attempt did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SaveOutcome {
    Saved { timestamp: i64 },
    AutoSaveDisabled,
    OperationInFlight,
    Invalid { errors: Vec<String> },
    StorageUnavailable,
    TimedOut,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// What a restore did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RestoreOutcome {
    /// Stored snapshot applied to live state
    Restored { timestamp: i64 },
    /// Stored data was unusable; the last-known-good snapshot was reapplied
    RolledBack { timestamp: i64 },
    /// Nothing stored, or storage unavailable
    NoData,
    /// Another import or restore holds the machine
    Busy,
    /// Stored record comes from an intentional clear
    Suppressed,
}

impl RestoreOutcome {
    pub fn applied(&self) -> bool {
        matches!(
            self,
            RestoreOutcome::Restored { .. } | RestoreOutcome::RolledBack { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestoreMode {
    Explicit,
    Boot,
}

struct Session {
    last_known_good: Option<DiagramSnapshot>,
    last_saved: Option<i64>,
    last_good_save: Option<i64>,
    has_saved_data: bool,
    auto_save_enabled: bool,
    auto_restore_latched: bool,
    /// Set by `clear`; the next empty save is marked as cleared
    cleared: bool,
    /// Override captured by the pending debounced save
    pending_override: Option<Option<Vec<Node>>>,
}

struct ManagerInner {
    store: Arc<dyn DurableStore>,
    host: Arc<dyn DiagramHost>,
    machine: OperationStateMachine,
    config: EngineConfig,
    debouncer: Debouncer,
    session: Mutex<Session>,
    /// Serialises store writes so an older write never lands last
    write_lock: tokio::sync::Mutex<()>,
}

/// Save/restore orchestration for one editing session
#[derive(Clone)]
pub struct ConsistencyManager {
    inner: Arc<ManagerInner>,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl ConsistencyManager {
    pub fn new(
        store: Arc<dyn DurableStore>,
        host: Arc<dyn DiagramHost>,
        config: EngineConfig,
    ) -> Self {
        let machine = OperationStateMachine::from_config(&config);
        Self::with_machine(store, host, machine, config)
    }

    /// Build around an existing machine, e.g. one shared with other observers
    pub fn with_machine(
        store: Arc<dyn DurableStore>,
        host: Arc<dyn DiagramHost>,
        machine: OperationStateMachine,
        config: EngineConfig,
    ) -> Self {
        let session = Session {
            last_known_good: None,
            last_saved: None,
            last_good_save: None,
            has_saved_data: false,
            auto_save_enabled: config.auto_save,
            auto_restore_latched: false,
            cleared: false,
            pending_override: None,
        };
        Self {
            inner: Arc::new(ManagerInner {
                store,
                host,
                machine,
                debouncer: Debouncer::new(config.save_debounce()),
                config,
                session: Mutex::new(session),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Observables =====

    /// Timestamp of the snapshot most recently written or restored
    pub fn last_saved(&self) -> Option<i64> {
        self.session().last_saved
    }

    /// Timestamp of the current last-known-good snapshot
    pub fn last_good_save(&self) -> Option<i64> {
        self.session().last_good_save
    }

    pub fn has_saved_data(&self) -> bool {
        self.session().has_saved_data
    }

    pub fn is_auto_save_enabled(&self) -> bool {
        self.session().auto_save_enabled
    }

    /// Switch auto-save; switching it off also drops a pending save
    pub fn set_auto_save_enabled(&self, enabled: bool) {
        self.session().auto_save_enabled = enabled;
        if !enabled {
            self.cancel_pending_save();
        }
    }

    pub fn last_known_good(&self) -> Option<DiagramSnapshot> {
        self.session().last_known_good.clone()
    }

    pub fn operation_state(&self) -> OperationState {
        self.inner.machine.state()
    }

    pub fn can_reflow_now(&self) -> bool {
        self.inner.machine.can_reflow_now()
    }

    pub fn machine(&self) -> &OperationStateMachine {
        &self.inner.machine
    }

    pub fn host(&self) -> &Arc<dyn DiagramHost> {
        &self.inner.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn save_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    // ===== Save =====

    /// Immutable snapshot of live state, or of `nodes_override` with live
    /// settings and layout metadata
    pub fn capture_snapshot(&self, nodes_override: Option<Vec<Node>>) -> DiagramSnapshot {
        let host = &self.inner.host;
        let nodes = nodes_override.unwrap_or_else(|| host.nodes());
        DiagramSnapshot::capture(nodes, host.settings(), host.layout_metadata())
    }

    /// Request a debounced save
    ///
    /// Coalesces with any pending request: only the latest call's state is
    /// written, one quiet interval after that call. With `None` the live
    /// state is read when the timer fires. Ignored while auto-save is off.
    /// Must be called from within a tokio runtime.
    pub fn save(&self, nodes_override: Option<Vec<Node>>) {
        {
            let mut session = self.session();
            if !session.auto_save_enabled {
                tracing::debug!(op = "save", "auto-save disabled; request dropped");
                return;
            }
            session.pending_override = Some(nodes_override);
        }

        let weak: Weak<ManagerInner> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(move || async move {
            if let Some(inner) = weak.upgrade() {
                ConsistencyManager { inner }.run_pending_save().await;
            }
        });
    }

    /// Write a pending debounced save now instead of waiting
    pub async fn flush_pending_save(&self) -> Option<SaveOutcome> {
        self.inner.debouncer.cancel();
        let pending = self.session().pending_override.take()?;
        Some(self.save_now(pending).await)
    }

    /// Drop a pending debounced save; returns whether one was pending
    pub fn cancel_pending_save(&self) -> bool {
        self.session().pending_override = None;
        self.inner.debouncer.cancel()
    }

    async fn run_pending_save(&self) {
        let Some(nodes_override) = self.session().pending_override.take() else {
            return;
        };
        let outcome = self.save_now(nodes_override).await;
        if !outcome.is_saved() {
            tracing::debug!(op = "save", outcome = ?outcome, "debounced save skipped");
        }
    }

    /// Save immediately, with the same gates as a debounced save
    pub async fn save_now(&self, nodes_override: Option<Vec<Node>>) -> SaveOutcome {
        if !self.is_auto_save_enabled() {
            return SaveOutcome::AutoSaveDisabled;
        }
        if self.inner.machine.is_busy() {
            tracing::debug!(
                op = "save",
                state = %self.inner.machine.state(),
                "save skipped while an operation is in flight"
            );
            return SaveOutcome::OperationInFlight;
        }
        let snapshot = self.capture_snapshot(nodes_override);
        self.write_snapshot(snapshot).await
    }

    /// Save live state ignoring the operation gate and the debounce
    ///
    /// Used by the import path for its own final write while the machine is
    /// still `Importing`.
    pub(crate) async fn force_save(&self) -> SaveOutcome {
        let snapshot = self.capture_snapshot(None);
        self.write_snapshot(snapshot).await
    }

    async fn write_snapshot(&self, snapshot: DiagramSnapshot) -> SaveOutcome {
        let report = validate_snapshot(&snapshot);
        if !report.is_ok() {
            tracing::warn!(
                op = "save",
                error_count = report.errors.len(),
                first_error = report.errors.first().map(String::as_str).unwrap_or_default(),
                "snapshot failed validation; not saved"
            );
            return SaveOutcome::Invalid {
                errors: report.errors,
            };
        }
        if !report.warnings.is_empty() {
            tracing::warn!(
                op = "save",
                warning_count = report.warnings.len(),
                "saving snapshot with warnings"
            );
        }

        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                return SaveOutcome::Invalid {
                    errors: vec![format!("snapshot could not be serialised: {}", e)],
                }
            }
        };
        let timestamp = snapshot.timestamp();
        let cleared = self.session().cleared && snapshot.is_empty();
        let record = DiagramRecord::new(payload, timestamp).with_cleared(cleared);

        let _write = self.inner.write_lock.lock().await;
        match self.bounded("store_put", self.inner.store.put(&record)).await {
            Ok(true) => {
                let mut session = self.session();
                session.last_known_good = Some(snapshot);
                session.last_saved = Some(timestamp);
                session.last_good_save = Some(timestamp);
                session.has_saved_data = true;
                session.cleared = cleared;
                tracing::debug!(op = "save", timestamp, "snapshot saved");
                SaveOutcome::Saved { timestamp }
            }
            Ok(false) => {
                tracing::warn!(op = "save", "durable storage refused the write");
                SaveOutcome::StorageUnavailable
            }
            Err(err) => {
                tracing::warn!(op = "save", err.code = err.code(), "storage write timed out");
                SaveOutcome::TimedOut
            }
        }
    }

    // ===== Restore =====

    /// Load, validate and apply the stored snapshot
    ///
    /// `Ok(Busy)` without touching storage or live state when an import or
    /// restore is already running. Corrupt stored data falls back to the
    /// last-known-good snapshot; without one the result is
    /// `ERR_CORRUPT_SNAPSHOT`.
    pub async fn restore(&self) -> Result<RestoreOutcome> {
        self.logged_restore("restore", RestoreMode::Explicit).await
    }

    /// Boot-time restore, at most once per session
    ///
    /// Returns `Ok(false)` when already latched, when nothing is stored, when
    /// the stored record comes from an intentional clear, or when another
    /// operation holds the machine. The latch is only kept after a restore
    /// that applied state.
    pub async fn check_and_auto_restore(&self) -> Result<bool> {
        {
            let mut session = self.session();
            if session.auto_restore_latched {
                tracing::debug!(op = "auto_restore", "already ran this session");
                return Ok(false);
            }
            // claimed now so an overlapping boot path sees the latch
            session.auto_restore_latched = true;
        }

        let result = self.logged_restore("auto_restore", RestoreMode::Boot).await;
        let applied = matches!(&result, Ok(outcome) if outcome.applied());
        if !applied {
            self.session().auto_restore_latched = false;
        }
        result.map(|outcome| outcome.applied())
    }

    async fn logged_restore(&self, op: &'static str, mode: RestoreMode) -> Result<RestoreOutcome> {
        log_op_start!(op);
        let start = Instant::now();

        match self.restore_impl(mode).await {
            Ok(outcome) => {
                log_op_end!(op, duration_ms = elapsed_ms(start), outcome = ?outcome);
                Ok(outcome)
            }
            Err(err) => {
                log_op_error!(op, err, duration_ms = elapsed_ms(start));
                Err(err)
            }
        }
    }

    async fn restore_impl(&self, mode: RestoreMode) -> Result<RestoreOutcome> {
        let machine = &self.inner.machine;
        if !machine.dispatch(OperationEvent::StartRestore) {
            return Ok(RestoreOutcome::Busy);
        }
        // a pending save would otherwise write pre-restore state afterwards
        self.cancel_pending_save();

        let loaded = match self.bounded("store_get", self.inner.store.get()).await {
            Ok(loaded) => loaded,
            Err(err) => return Err(self.abandon(err)),
        };
        let Some(stored) = loaded else {
            machine.dispatch(OperationEvent::Error);
            return Ok(RestoreOutcome::NoData);
        };
        if mode == RestoreMode::Boot && stored.record.cleared {
            tracing::info!(op = "auto_restore", "stored diagram was cleared on purpose");
            machine.dispatch(OperationEvent::Error);
            return Ok(RestoreOutcome::Suppressed);
        }

        let snapshot = match decode_stored(&stored) {
            Ok(snapshot) => snapshot,
            Err(problems) => return self.recover_from_corruption(problems).await,
        };

        machine.dispatch(OperationEvent::RestoreApplying);
        if let Err(err) = self.apply(&snapshot).await {
            return Err(self.abandon(err));
        }

        let timestamp = snapshot.timestamp();
        {
            let mut session = self.session();
            session.last_known_good = Some(snapshot);
            session.last_saved = Some(timestamp);
            session.last_good_save = Some(timestamp);
            session.has_saved_data = true;
            session.cleared = stored.record.cleared;
        }
        machine.dispatch(OperationEvent::Complete);
        Ok(RestoreOutcome::Restored { timestamp })
    }

    async fn recover_from_corruption(&self, problems: Vec<String>) -> Result<RestoreOutcome> {
        tracing::warn!(
            op = "restore",
            problem_count = problems.len(),
            first_problem = problems.first().map(String::as_str).unwrap_or_default(),
            "stored snapshot is corrupt"
        );

        if self.session().last_known_good.is_none() {
            let err = ExError::new(ExErrorKind::CorruptSnapshot)
                .with_op("restore")
                .with_message("Saved diagram is corrupt and no earlier good state is available")
                .with_details(problems);
            return Err(self.abandon(err));
        }

        self.inner.machine.dispatch(OperationEvent::RestoreApplying);
        match self.reassert_last_good().await {
            Ok(Some(timestamp)) => {
                self.inner.machine.dispatch(OperationEvent::Complete);
                Ok(RestoreOutcome::RolledBack { timestamp })
            }
            Ok(None) => Err(self.abandon(ExError::new(ExErrorKind::Internal).with_op("rollback"))),
            Err(err) => Err(self.abandon(err)),
        }
    }

    /// Reapply the last-known-good snapshot and write it back as canonical
    ///
    /// `Ok(false)` when no last-known-good snapshot exists this session or
    /// another operation holds the machine.
    pub async fn rollback_to_last_good(&self) -> Result<bool> {
        log_op_start!("rollback");
        let start = Instant::now();

        let result = self.rollback_impl().await;
        match &result {
            Ok(rolled_back) => {
                log_op_end!("rollback", duration_ms = elapsed_ms(start), rolled_back = *rolled_back);
            }
            Err(err) => log_op_error!("rollback", err, duration_ms = elapsed_ms(start)),
        }
        result
    }

    async fn rollback_impl(&self) -> Result<bool> {
        if self.session().last_known_good.is_none() {
            return Ok(false);
        }
        let machine = &self.inner.machine;
        if !machine.dispatch(OperationEvent::StartRestore) {
            return Ok(false);
        }
        self.cancel_pending_save();
        machine.dispatch(OperationEvent::RestoreApplying);

        match self.reassert_last_good().await {
            Ok(Some(_)) => {
                machine.dispatch(OperationEvent::Complete);
                Ok(true)
            }
            Ok(None) => {
                machine.dispatch(OperationEvent::Error);
                Ok(false)
            }
            Err(err) => Err(self.abandon(err)),
        }
    }

    /// Write back and reapply the last-known-good snapshot, outside the machine
    async fn reassert_last_good(&self) -> Result<Option<i64>> {
        let Some(snapshot) = self.last_known_good() else {
            return Ok(None);
        };
        let timestamp = snapshot.timestamp();

        match serde_json::to_string(&snapshot) {
            Ok(payload) => {
                let record = DiagramRecord::new(payload, timestamp);
                let _write = self.inner.write_lock.lock().await;
                match self.bounded("store_put", self.inner.store.put(&record)).await {
                    Ok(true) => {
                        let mut session = self.session();
                        session.has_saved_data = true;
                        session.last_saved = Some(timestamp);
                    }
                    Ok(false) => tracing::warn!(
                        op = "rollback",
                        "could not write last-known-good back; applying in memory only"
                    ),
                    Err(err) => tracing::warn!(
                        op = "rollback",
                        err.code = err.code(),
                        "write-back timed out; applying in memory only"
                    ),
                }
            }
            Err(e) => tracing::warn!(op = "rollback", error = %e, "last-known-good not serialisable"),
        }

        self.apply(&snapshot).await?;
        Ok(Some(timestamp))
    }

    // ===== Clear =====

    /// Delete the stored diagram and forget last-known-good
    ///
    /// Also re-arms the boot-time auto-restore latch.
    pub async fn clear(&self) {
        log_op_start!("clear");
        let start = Instant::now();

        self.cancel_pending_save();
        if let Err(err) = self.bounded("store_delete", self.inner.store.delete()).await {
            tracing::warn!(op = "clear", err.code = err.code(), "delete timed out");
        }
        {
            let mut session = self.session();
            session.last_known_good = None;
            session.last_saved = None;
            session.last_good_save = None;
            session.has_saved_data = false;
            session.auto_restore_latched = false;
            session.cleared = true;
        }

        log_op_end!("clear", duration_ms = elapsed_ms(start));
    }

    // ===== Internals =====

    /// Hand a snapshot to the live-state collaborator, bounded by the timeout
    async fn apply(&self, snapshot: &DiagramSnapshot) -> Result<()> {
        let (nodes, settings, layout) = snapshot.clone().into_parts();
        self.bounded(
            "apply_restored_state",
            self.inner.host.apply_restored_state(nodes, settings, layout),
        )
        .await?
    }

    /// Await `fut` within the configured storage timeout
    pub(crate) async fn bounded<F: Future>(&self, op: &'static str, fut: F) -> Result<F::Output> {
        let Some(limit) = self.inner.config.storage_timeout() else {
            return Ok(fut.await);
        };
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            ExError::new(ExErrorKind::Timeout)
                .with_op(op)
                .with_message(format!("{} did not finish within {} ms", op, limit.as_millis()))
        })
    }

    /// Abandon the in-flight operation and pass the error on
    fn abandon(&self, err: ExError) -> ExError {
        self.inner.machine.dispatch(OperationEvent::Error);
        err
    }
}

/// Turn a stored record into a validated snapshot, or the reasons it is not one
fn decode_stored(stored: &StoredRecord) -> std::result::Result<DiagramSnapshot, Vec<String>> {
    if !stored.intact {
        return Err(vec![
            "stored payload does not match its digest".to_string()
        ]);
    }
    let value: serde_json::Value = serde_json::from_str(&stored.record.payload)
        .map_err(|e| vec![format!("stored payload is not JSON: {}", e)])?;

    let report = validate_value(&value);
    if !report.is_ok() {
        return Err(report.errors);
    }
    if !report.warnings.is_empty() {
        tracing::warn!(
            op = "restore",
            warning_count = report.warnings.len(),
            "restoring snapshot with warnings"
        );
    }
    DiagramSnapshot::from_validated_value(&value).map_err(|e| vec![e.to_string()])
}
