//! NestCanvas Engine - persistence and consistency orchestration
//!
//! Coordinates the pure core (validation, transition table) with durable
//! storage and the live diagram:
//! - Timed operation state machine with settle windows
//! - Debounced, validated saves with last-known-good tracking
//! - Validated restores with rollback
//! - Staged imports committed in one apply

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod host;
pub mod live;
pub mod manager;
pub mod operation_state;

pub use config::EngineConfig;
pub use coordinator::{Coordinator, ImportOutcome, ImportSummary};
pub use host::{DiagramHost, IdAssignment};
pub use live::LiveDiagram;
pub use manager::{ConsistencyManager, RestoreOutcome, SaveOutcome};
pub use operation_state::OperationStateMachine;
