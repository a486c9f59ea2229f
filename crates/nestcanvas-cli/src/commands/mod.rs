//! Subcommand implementations

pub mod clear;
pub mod export;
pub mod import;
pub mod restore;
pub mod status;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nestcanvas_core::errors::{ExError, ExErrorKind, Result};
use nestcanvas_engine::{ConsistencyManager, Coordinator, EngineConfig, LiveDiagram};
use nestcanvas_store::SqliteStore;

/// Global flags shared by every subcommand
pub struct Context {
    pub db: PathBuf,
    pub config: Option<PathBuf>,
}

/// One engine session over the on-disk store
pub struct Session {
    pub live: Arc<LiveDiagram>,
    pub coordinator: Coordinator,
}

impl Context {
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path),
            None => Ok(EngineConfig::default()),
        }
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.db)
    }

    pub fn session(&self) -> Result<Session> {
        let config = self.engine_config()?;
        let store = self.open_store()?;
        let live = Arc::new(LiveDiagram::new());
        let manager = ConsistencyManager::new(Arc::new(store), live.clone(), config);
        Ok(Session {
            live,
            coordinator: Coordinator::new(manager),
        })
    }
}

pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        ExError::new(ExErrorKind::Io).with_message(format!("cannot read {}: {}", path.display(), e))
    })
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        ExError::new(ExErrorKind::Serialization).with_message(e.to_string())
    })?;
    println!("{}", text);
    Ok(())
}

/// Milliseconds since the epoch as RFC 3339, or the raw number if out of range
pub(crate) fn format_timestamp(ms: i64) -> String {
    use chrono::TimeZone;
    match chrono::Utc.timestamp_millis_opt(ms).single() {
        Some(at) => at.to_rfc3339(),
        None => ms.to_string(),
    }
}
