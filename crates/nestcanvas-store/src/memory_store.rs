//! In-process durable store
//!
//! Used by tests and by sessions that never had storage. Availability,
//! latency and stored bytes can all be manipulated to reproduce the failure
//! cases of a real backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::durable::DurableStore;
use crate::record::{DiagramRecord, StoredRecord};

struct Slot {
    record: DiagramRecord,
    digest: String,
}

struct MemoryState {
    slot: Option<Slot>,
    available: bool,
    latency: Option<Duration>,
    writes: usize,
    reads: usize,
    deletes: usize,
}

#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                slot: None,
                available: true,
                latency: None,
                writes: 0,
                reads: 0,
                deletes: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Delay every call by `latency` (tokio time, so paused clocks apply)
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Reads that reached the slot so far
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    pub fn delete_count(&self) -> usize {
        self.lock().deletes
    }

    /// Current record without going through the async contract
    pub fn current(&self) -> Option<DiagramRecord> {
        self.lock().slot.as_ref().map(|s| s.record.clone())
    }

    /// Place a record directly, with a matching digest
    pub fn inject(&self, record: DiagramRecord) {
        let digest = record.digest();
        self.lock().slot = Some(Slot { record, digest });
    }

    /// Replace the stored payload but keep the old digest
    ///
    /// The next read reports the record as not intact. No-op when empty.
    pub fn tamper(&self, payload: impl Into<String>) {
        if let Some(slot) = self.lock().slot.as_mut() {
            slot.record.payload = payload.into();
        }
    }

    async fn delay(&self) {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn put(&self, record: &DiagramRecord) -> bool {
        self.delay().await;
        let mut state = self.lock();
        if !state.available {
            tracing::warn!(op = "store_put", "memory store unavailable");
            return false;
        }
        state.slot = Some(Slot {
            record: record.clone(),
            digest: record.digest(),
        });
        state.writes += 1;
        true
    }

    async fn get(&self) -> Option<StoredRecord> {
        self.delay().await;
        let mut state = self.lock();
        if !state.available {
            return None;
        }
        state.reads += 1;
        state
            .slot
            .as_ref()
            .map(|slot| StoredRecord::verify(slot.record.clone(), &slot.digest))
    }

    async fn delete(&self) {
        self.delay().await;
        let mut state = self.lock();
        if state.available {
            state.slot = None;
            state.deletes += 1;
        }
    }

    fn is_available(&self) -> bool {
        self.lock().available
    }
}
