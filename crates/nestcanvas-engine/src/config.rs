//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! save_debounce_ms = 1000
//! import_settle_ms = 50
//! restore_settle_ms = 250
//! storage_timeout_ms = 5000   # 0 disables the timeout
//! auto_save = true
//! ```

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::time::Duration;

use nestcanvas_core::errors::{ExError, ExErrorKind, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Quiet interval before a burst of save requests is written
    pub save_debounce_ms: u64,
    /// Layout lock after an import completes
    pub import_settle_ms: u64,
    /// Layout lock after a restore completes
    pub restore_settle_ms: u64,
    /// Upper bound on one storage call or state apply; 0 means unbounded
    pub storage_timeout_ms: u64,
    /// Initial auto-save switch
    pub auto_save: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 1000,
            import_settle_ms: 50,
            restore_settle_ms: 250,
            storage_timeout_ms: 5000,
            auto_save: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_parse")
                .with_message(e.to_string())
        })
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn import_settle(&self) -> Duration {
        Duration::from_millis(self.import_settle_ms)
    }

    pub fn restore_settle(&self) -> Duration {
        Duration::from_millis(self.restore_settle_ms)
    }

    pub fn storage_timeout(&self) -> Option<Duration> {
        (self.storage_timeout_ms > 0).then(|| Duration::from_millis(self.storage_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str("save_debounce_ms = 10\nauto_save = false").unwrap();
        assert_eq!(config.save_debounce(), Duration::from_millis(10));
        assert!(!config.auto_save);
        assert_eq!(config.restore_settle_ms, 250);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = EngineConfig::from_toml_str("storage_timeout_ms = 0").unwrap();
        assert_eq!(config.storage_timeout(), None);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = EngineConfig::from_toml_str("save_debounce = 5").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_settle_windows_are_ordered() {
        let config = EngineConfig::default();
        assert!(config.import_settle() < config.restore_settle());
    }
}
