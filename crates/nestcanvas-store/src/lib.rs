//! NestCanvas Store - durable single-record persistence for diagram snapshots
//!
//! Provides:
//! - The async `DurableStore` contract (best-effort put/get/delete)
//! - A SQLite implementation with checksummed embedded migrations
//! - An in-memory implementation for tests and storage-less sessions
//! - Payload digests so torn or tampered records are detected on read
//! - Atomic file writes for exports

pub mod atomic;
pub mod db;
pub mod digest;
pub mod durable;
pub mod errors;
pub mod memory_store;
pub mod migrations;
pub mod record;
pub mod repo;
pub mod sqlite_store;

// Re-export key types
pub use durable::DurableStore;
pub use errors::Result;
pub use memory_store::MemoryStore;
pub use record::{DiagramRecord, StoredRecord, CURRENT_DIAGRAM_KEY};
pub use sqlite_store::SqliteStore;
