//! The one persisted record

use crate::digest::sha256_hex;

/// Key of the single "current diagram" slot
pub const CURRENT_DIAGRAM_KEY: &str = "current-diagram";

/// What the engine writes: the snapshot JSON plus its capture time
///
/// `cleared` marks a record written right after an intentional clear, so
/// boot does not auto-restore an emptied canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRecord {
    pub payload: String,
    pub timestamp: i64,
    pub cleared: bool,
}

impl DiagramRecord {
    pub fn new(payload: impl Into<String>, timestamp: i64) -> Self {
        Self {
            payload: payload.into(),
            timestamp,
            cleared: false,
        }
    }

    pub fn with_cleared(mut self, cleared: bool) -> Self {
        self.cleared = cleared;
        self
    }

    /// SHA-256 of the payload, stored beside it
    pub fn digest(&self) -> String {
        sha256_hex(&self.payload)
    }
}

/// A record read back from storage
///
/// `intact` is false when the payload no longer matches the digest written
/// with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub record: DiagramRecord,
    pub intact: bool,
}

impl StoredRecord {
    /// Check a payload against the digest it was stored with
    pub fn verify(record: DiagramRecord, stored_digest: &str) -> Self {
        let intact = record.digest() == stored_digest;
        Self { record, intact }
    }
}
