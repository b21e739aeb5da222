mod config;
pub mod sqlite;

pub use config::{
    AmbientConfig, BreakInviteConfig, CompanionConfig, DisplayConfig, EventsConfig, GateConfig,
    WelcomeBackConfig,
};
pub use sqlite::SqliteStore;

use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{ConfigError, StoreError};

/// String key-value capability the gate and ledger persist through.
///
/// The durable store outlives reloads; the tab store lives as long as the
/// tab. Both are the same trait so the host decides what backs each.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and parse one stored value. `Ok(None)` when the key is absent, and
/// [`StoreError::Corrupt`] when the value is present but does not parse.
pub fn decode<T, E: Display>(
    store: &dyn Store,
    key: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    parse(&raw).map(Some).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// In-process store. Clones share contents, so a "reload" can be modelled
/// by building a new companion over a clone of the same tab store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock()?.remove(key);
        Ok(())
    }
}

/// Returns `~/.config/companion[-dev]/` based on COMPANION_ENV.
///
/// Set COMPANION_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("COMPANION_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("companion-dev")
    } else {
        base_dir.join("companion")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let reloaded = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(reloaded.get("k").unwrap().as_deref(), Some("v"));
        reloaded.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn decode_names_the_corrupt_key() {
        let store = MemoryStore::new();
        assert_eq!(decode(&store, "n", |raw| raw.parse::<u64>()).unwrap(), None);

        store.set("n", "42").unwrap();
        assert_eq!(decode(&store, "n", |raw| raw.parse::<u64>()).unwrap(), Some(42));

        store.set("n", "forty-two").unwrap();
        let err = decode(&store, "n", |raw| raw.parse::<u64>()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "n"));
    }
}
