//! The durable store contract

use async_trait::async_trait;

use crate::record::{DiagramRecord, StoredRecord};

/// Best-effort persistence of the single current-diagram record
///
/// Nothing here returns an error. Unavailable or failing storage makes `put`
/// return `false` and `get` return `None`; implementations log the cause.
/// The caller keeps editing in memory and reflects the loss of durability
/// only through its observables.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Write the record, replacing any previous one
    async fn put(&self, record: &DiagramRecord) -> bool;

    /// Read the record; `None` on miss or unavailability
    async fn get(&self) -> Option<StoredRecord>;

    /// Remove the record; idempotent
    async fn delete(&self);

    /// Whether storage was usable when last checked
    fn is_available(&self) -> bool;
}
