//! NestCanvas Core - pure domain kernel of the diagram persistence engine
//!
//! This crate holds everything that does not touch I/O or timers:
//! - The diagram data model (nodes, settings, layout metadata, snapshots)
//! - The snapshot validator and its graph invariants
//! - The operation state transition table
//! - The structured error and logging facilities shared by every crate

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod operation;
pub mod rules;

pub use nestcanvas_core_types::schema;

// Re-export commonly used types
pub use errors::{DiagramError, DiagramResult, ExError, ExErrorKind, Result};
pub use model::{DiagramSnapshot, LayoutMetadata, Node, NodeKind, Settings, FORMAT_VERSION};
pub use operation::{ImportStage, LockReason, OperationEvent, OperationState, RestoreStage};
pub use rules::{validate_snapshot, validate_value, ValidationReport};
