//! SQLite-backed durable store

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db;
use crate::durable::DurableStore;
use crate::errors::{join_error, unavailable, Result};
use crate::migrations::apply_migrations;
use crate::record::{DiagramRecord, StoredRecord, CURRENT_DIAGRAM_KEY};
use crate::repo::RecordRepo;

/// Durable store over one SQLite connection
///
/// A store built with [`SqliteStore::disabled`] (or a failed
/// [`SqliteStore::open_or_disabled`]) holds no connection; every call then
/// degrades the way an unavailable backend does.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Option<Arc<Mutex<Connection>>>,
    key: String,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open the database, or fall back to a disabled store
    ///
    /// The session then edits in memory only.
    pub fn open_or_disabled<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    err.code = err.code(),
                    err.message = %err.message(),
                    "durable storage unavailable; continuing in memory"
                );
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            conn: None,
            key: CURRENT_DIAGRAM_KEY.to_string(),
        }
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Some(Arc::new(Mutex::new(conn))),
            key: CURRENT_DIAGRAM_KEY.to_string(),
        }
    }

    /// Use a different record slot (several diagrams in one file)
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone().ok_or_else(|| unavailable(op))?;
        let key = self.key.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard, &key)
        })
        .await
        .map_err(|e| join_error(op, e))?
    }
}

fn log_failure(op: &str, key: &str, err: &nestcanvas_core::ExError) {
    tracing::warn!(
        op,
        record_key = key,
        err.code = err.code(),
        err.message = %err.message(),
        "storage call failed"
    );
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn put(&self, record: &DiagramRecord) -> bool {
        let record = record.clone();
        match self
            .run("store_put", move |conn, key| {
                RecordRepo::write(conn, key, &record)
            })
            .await
        {
            Ok(()) => true,
            Err(err) => {
                log_failure("store_put", &self.key, &err);
                false
            }
        }
    }

    async fn get(&self) -> Option<StoredRecord> {
        match self
            .run("store_get", |conn, key| RecordRepo::read(conn, key))
            .await
        {
            Ok(found) => found,
            Err(err) => {
                log_failure("store_get", &self.key, &err);
                None
            }
        }
    }

    async fn delete(&self) {
        if let Err(err) = self
            .run("store_delete", |conn, key| RecordRepo::remove(conn, key))
            .await
        {
            log_failure("store_delete", &self.key, &err);
        }
    }

    fn is_available(&self) -> bool {
        self.conn.is_some()
    }
}
