//! Import/restore coordinator
//!
//! The user-facing entry points. Imports are driven here step by step; restores
//! and boot delegate to the [`ConsistencyManager`].
//!
//! An import stages everything (decode, validation, fresh ids, dimension
//! enforcement, re-validation) into one snapshot before live state is touched,
//! then commits it with a single `apply_restored_state` call.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::time::Instant;

use nestcanvas_core::errors::{DiagramError, ExError, ExErrorKind, Result};
use nestcanvas_core::model::DiagramSnapshot;
use nestcanvas_core::operation::OperationEvent;
use nestcanvas_core::rules::{validate_snapshot, validate_value};
use nestcanvas_core::{log_op_end, log_op_error, log_op_start};
use nestcanvas_store::atomic::atomic_write;
use serde::Serialize;

use crate::host::IdAssignment;
use crate::manager::{ConsistencyManager, RestoreOutcome, SaveOutcome};

/// Result of a successful import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub node_count: usize,
    pub warnings: Vec<String>,
    pub next_id_counter: u64,
    /// Fixed dimensions were re-imposed because the layout permits reflow
    pub reflowed: bool,
    /// The import's own immediate save
    pub save: SaveOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ImportOutcome {
    Imported(ImportSummary),
    /// Another import or restore holds the machine; nothing was done
    Busy,
}

pub struct Coordinator {
    manager: ConsistencyManager,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Wrap an import failure in the message shown to the user
fn import_failure(err: ExError) -> ExError {
    let message = format!("Import failed: {}", err.message());
    ExError::new(err.kind())
        .with_op("import")
        .with_message(message)
        .with_details(err.details().to_vec())
        .with_source(err)
}

impl Coordinator {
    pub fn new(manager: ConsistencyManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConsistencyManager {
        &self.manager
    }

    /// Read `path` and import its contents
    ///
    /// A file that cannot be read fails before any state transition.
    pub async fn import_file(&self, path: &Path) -> Result<ImportOutcome> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            import_failure(
                ExError::new(ExErrorKind::Io)
                    .with_message(format!("cannot read {}: {}", path.display(), e)),
            )
        })?;
        self.import_bytes(&bytes).await
    }

    /// Import a snapshot file's bytes into live state and storage
    ///
    /// Auto-save is off for the whole import and restored afterwards, on
    /// success and on failure. Errors carry a user-facing message.
    pub async fn import_bytes(&self, bytes: &[u8]) -> Result<ImportOutcome> {
        log_op_start!("import", byte_len = bytes.len() as u64);
        let start = Instant::now();

        let manager = &self.manager;
        let machine = manager.machine();
        let auto_save = manager.is_auto_save_enabled();

        // a refused import must leave pending saves alone
        if !machine.dispatch(OperationEvent::StartImport) {
            log_op_end!("import", duration_ms = elapsed_ms(start), busy = true);
            return Ok(ImportOutcome::Busy);
        }
        manager.set_auto_save_enabled(false);

        match self.stage_and_apply(bytes).await {
            Ok(mut summary) => {
                manager.set_auto_save_enabled(auto_save);
                summary.save = manager.force_save().await;
                machine.dispatch(OperationEvent::Complete);

                log_op_end!(
                    "import",
                    duration_ms = elapsed_ms(start),
                    node_count = summary.node_count as u64,
                    warning_count = summary.warnings.len() as u64
                );
                Ok(ImportOutcome::Imported(summary))
            }
            Err(err) => {
                machine.dispatch(OperationEvent::Error);
                manager.set_auto_save_enabled(auto_save);

                let err = import_failure(err);
                log_op_error!("import", err, duration_ms = elapsed_ms(start));
                Err(err)
            }
        }
    }

    async fn stage_and_apply(&self, bytes: &[u8]) -> Result<ImportSummary> {
        let manager = &self.manager;
        let machine = manager.machine();
        let host = manager.host();

        // loading
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_message(format!("file is not UTF-8 text: {}", e))
        })?;
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ExError::from(DiagramError::from(e)))?;

        machine.dispatch(OperationEvent::ImportProcessing);
        let report = validate_value(&value);
        let warnings = report.into_result().map_err(ExError::from)?;
        for warning in &warnings {
            tracing::warn!(op = "import", warning = warning.as_str(), "import warning");
        }
        let decoded = DiagramSnapshot::from_validated_value(&value)?;

        machine.dispatch(OperationEvent::ImportApplying);
        let (nodes, settings, layout_metadata) = decoded.into_parts();
        let IdAssignment {
            nodes,
            next_id_counter,
        } = host.assign_fresh_ids(nodes);

        let reflowed = host.can_reflow(&layout_metadata);
        let nodes = if reflowed {
            host.enforce_fixed_dimensions(nodes, &layout_metadata, &settings)?
        } else {
            nodes
        };

        let staged = DiagramSnapshot::capture(nodes, settings, layout_metadata);
        let recheck = validate_snapshot(&staged);
        if !recheck.is_ok() {
            return Err(ExError::new(ExErrorKind::InvalidSnapshot)
                .with_message("imported diagram became invalid while being prepared")
                .with_details(recheck.errors));
        }

        let node_count = staged.nodes().len();
        let (nodes, settings, layout_metadata) = staged.into_parts();
        manager
            .bounded(
                "apply_restored_state",
                host.apply_restored_state(nodes, settings, layout_metadata),
            )
            .await??;

        Ok(ImportSummary {
            node_count,
            warnings,
            next_id_counter,
            reflowed,
            save: SaveOutcome::AutoSaveDisabled,
        })
    }

    /// User-initiated restore
    pub async fn restore(&self) -> Result<RestoreOutcome> {
        self.manager.restore().await
    }

    /// Boot-time restore; see [`ConsistencyManager::check_and_auto_restore`]
    pub async fn boot(&self) -> Result<bool> {
        self.manager.check_and_auto_restore().await
    }

    /// Write live state to `path` in the import file format
    ///
    /// Returns the number of nodes written.
    pub async fn export_to(&self, path: &Path) -> Result<usize> {
        log_op_start!("export");
        let start = Instant::now();

        let snapshot = self.manager.capture_snapshot(None);
        let node_count = snapshot.nodes().len();
        let result = match serde_json::to_vec_pretty(&snapshot) {
            Ok(bytes) => {
                let path = path.to_path_buf();
                tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
                    .await
                    .map_err(|e| {
                        ExError::new(ExErrorKind::Internal)
                            .with_op("export")
                            .with_message(e.to_string())
                    })
                    .and_then(|written| written)
            }
            Err(e) => Err(ExError::from(DiagramError::from(e))),
        };

        match result {
            Ok(()) => {
                log_op_end!("export", duration_ms = elapsed_ms(start), node_count = node_count as u64);
                Ok(node_count)
            }
            Err(err) => {
                log_op_error!("export", err, duration_ms = elapsed_ms(start));
                Err(err)
            }
        }
    }
}
