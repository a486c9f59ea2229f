//! SQL access to the `diagram_records` table

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::record::{DiagramRecord, StoredRecord};
use rusqlite::{Connection, OptionalExtension};

/// Row-level operations on diagram records
pub struct RecordRepo;

impl RecordRepo {
    /// Insert or replace the record under `key`
    pub fn write(conn: &Connection, key: &str, record: &DiagramRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO diagram_records
                (record_key, payload, payload_digest, saved_at, written_at, cleared)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(record_key) DO UPDATE SET
                payload = excluded.payload,
                payload_digest = excluded.payload_digest,
                saved_at = excluded.saved_at,
                written_at = excluded.written_at,
                cleared = excluded.cleared",
            rusqlite::params![
                key,
                record.payload,
                record.digest(),
                record.timestamp,
                chrono::Utc::now().timestamp_millis(),
                if record.cleared { 1 } else { 0 },
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Read the record under `key`, verifying its digest
    pub fn read(conn: &Connection, key: &str) -> Result<Option<StoredRecord>> {
        let row = conn
            .query_row(
                "SELECT payload, payload_digest, saved_at, cleared
                 FROM diagram_records WHERE record_key = ?1",
                [key],
                |row| {
                    let payload: String = row.get(0)?;
                    let digest: String = row.get(1)?;
                    let saved_at: i64 = row.get(2)?;
                    let cleared: i64 = row.get(3)?;
                    Ok((payload, digest, saved_at, cleared != 0))
                },
            )
            .optional()
            .map_err(from_rusqlite)?;

        Ok(row.map(|(payload, digest, saved_at, cleared)| {
            let record = DiagramRecord::new(payload, saved_at).with_cleared(cleared);
            StoredRecord::verify(record, &digest)
        }))
    }

    /// Delete the record under `key`; returns whether a row was removed
    pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
        let removed = conn
            .execute("DELETE FROM diagram_records WHERE record_key = ?1", [key])
            .map_err(from_rusqlite)?;
        Ok(removed > 0)
    }
}
