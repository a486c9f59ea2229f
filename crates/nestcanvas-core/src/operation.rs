//! Operation states and the pure transition table
//!
//! The timed half of the machine (settle delays, cancellation) lives in the
//! engine crate; this module only answers "what does this event do from this
//! state".

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportStage {
    Loading,
    Processing,
    Applying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreStage {
    Loading,
    Applying,
}

/// Which operation the settle window follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LockReason {
    Import,
    Restore,
}

/// Operational mode of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "camelCase")]
pub enum OperationState {
    #[default]
    Idle,
    Importing(ImportStage),
    Restoring(RestoreStage),
    LayoutLocked(LockReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationEvent {
    StartImport,
    ImportProcessing,
    ImportApplying,
    StartRestore,
    RestoreApplying,
    Complete,
    Error,
}

impl OperationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationEvent::StartImport => "start_import",
            OperationEvent::ImportProcessing => "import_processing",
            OperationEvent::ImportApplying => "import_applying",
            OperationEvent::StartRestore => "start_restore",
            OperationEvent::RestoreApplying => "restore_applying",
            OperationEvent::Complete => "complete",
            OperationEvent::Error => "error",
        }
    }
}

impl std::fmt::Display for OperationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OperationState {
    /// Apply `event` to this state
    ///
    /// Returns `None` when the event is not listed for the current state;
    /// callers treat that as a no-op.
    pub fn on(self, event: OperationEvent) -> Option<OperationState> {
        use OperationEvent as E;
        use OperationState as S;

        match (self, event) {
            (S::Idle, E::StartImport) => Some(S::Importing(ImportStage::Loading)),
            (S::Importing(ImportStage::Loading), E::ImportProcessing) => {
                Some(S::Importing(ImportStage::Processing))
            }
            (S::Importing(ImportStage::Processing), E::ImportApplying) => {
                Some(S::Importing(ImportStage::Applying))
            }
            (S::Idle, E::StartRestore) => Some(S::Restoring(RestoreStage::Loading)),
            (S::Restoring(RestoreStage::Loading), E::RestoreApplying) => {
                Some(S::Restoring(RestoreStage::Applying))
            }
            (S::Importing(_), E::Complete) => Some(S::LayoutLocked(LockReason::Import)),
            (S::Restoring(_), E::Complete) => Some(S::LayoutLocked(LockReason::Restore)),
            (S::LayoutLocked(_), E::Complete) => Some(S::Idle),
            (S::Idle, E::Error) => None,
            (_, E::Error) => Some(S::Idle),
            _ => None,
        }
    }

    /// An import or restore is in flight
    ///
    /// The settle window does not count, so saves may run during it. New
    /// operations still wait for `Idle`.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            OperationState::Importing(_) | OperationState::Restoring(_)
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    /// Automatic reflow is only safe when nothing is loading or settling
    pub fn permits_reflow(&self) -> bool {
        self.is_idle()
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationState::Idle => "idle",
            OperationState::Importing(ImportStage::Loading) => "importing/loading",
            OperationState::Importing(ImportStage::Processing) => "importing/processing",
            OperationState::Importing(ImportStage::Applying) => "importing/applying",
            OperationState::Restoring(RestoreStage::Loading) => "restoring/loading",
            OperationState::Restoring(RestoreStage::Applying) => "restoring/applying",
            OperationState::LayoutLocked(LockReason::Import) => "layout_locked/import",
            OperationState::LayoutLocked(LockReason::Restore) => "layout_locked/restore",
        }
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperationEvent as E;
    use OperationState as S;

    const ALL_EVENTS: [OperationEvent; 7] = [
        E::StartImport,
        E::ImportProcessing,
        E::ImportApplying,
        E::StartRestore,
        E::RestoreApplying,
        E::Complete,
        E::Error,
    ];

    #[test]
    fn test_import_path() {
        let s = S::Idle.on(E::StartImport).unwrap();
        let s = s.on(E::ImportProcessing).unwrap();
        let s = s.on(E::ImportApplying).unwrap();
        assert_eq!(s, S::Importing(ImportStage::Applying));
        let s = s.on(E::Complete).unwrap();
        assert_eq!(s, S::LayoutLocked(LockReason::Import));
        assert_eq!(s.on(E::Complete), Some(S::Idle));
    }

    #[test]
    fn test_restore_complete_from_any_stage() {
        let loading = S::Restoring(RestoreStage::Loading);
        assert_eq!(
            loading.on(E::Complete),
            Some(S::LayoutLocked(LockReason::Restore))
        );
        assert_eq!(
            loading.on(E::RestoreApplying).and_then(|s| s.on(E::Complete)),
            Some(S::LayoutLocked(LockReason::Restore))
        );
    }

    #[test]
    fn test_second_start_is_ignored() {
        let importing = S::Importing(ImportStage::Processing);
        assert_eq!(importing.on(E::StartImport), None);
        assert_eq!(importing.on(E::StartRestore), None);
        assert_eq!(S::Restoring(RestoreStage::Loading).on(E::StartImport), None);
        assert_eq!(S::LayoutLocked(LockReason::Import).on(E::StartRestore), None);
    }

    #[test]
    fn test_error_returns_to_idle_from_every_non_idle_state() {
        let states = [
            S::Importing(ImportStage::Loading),
            S::Importing(ImportStage::Processing),
            S::Importing(ImportStage::Applying),
            S::Restoring(RestoreStage::Loading),
            S::Restoring(RestoreStage::Applying),
            S::LayoutLocked(LockReason::Import),
            S::LayoutLocked(LockReason::Restore),
        ];
        for state in states {
            assert_eq!(state.on(E::Error), Some(S::Idle), "{state}");
        }
        assert_eq!(S::Idle.on(E::Error), None);
    }

    #[test]
    fn test_idle_only_accepts_starts() {
        for event in ALL_EVENTS {
            let next = S::Idle.on(event);
            match event {
                E::StartImport | E::StartRestore => assert!(next.is_some()),
                _ => assert!(next.is_none(), "{event} should be ignored"),
            }
        }
    }

    #[test]
    fn test_busy_and_reflow() {
        assert!(!S::Idle.is_busy());
        assert!(S::Idle.permits_reflow());
        assert!(S::Importing(ImportStage::Loading).is_busy());
        let locked = S::LayoutLocked(LockReason::Restore);
        assert!(!locked.is_busy());
        assert!(!locked.permits_reflow());
    }

    #[test]
    fn test_serializes_tagged() {
        let value = serde_json::to_value(S::Importing(ImportStage::Applying)).unwrap();
        assert_eq!(value, serde_json::json!({"state": "importing", "stage": "applying"}));
        let idle = serde_json::to_value(S::Idle).unwrap();
        assert_eq!(idle, serde_json::json!({"state": "idle"}));
    }
}
