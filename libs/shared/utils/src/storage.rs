use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// Keys of the client-persisted state. No schema versioning.
pub mod keys {
    pub const JWT_TOKEN: &str = "jwt_token";
    pub const CURRENT_USER: &str = "current_user";
    pub const RESET_EMAIL: &str = "resetEmail";
    pub const AREA_PREFERENCE: &str = "areaPreference";
}

/// Flat string key-value storage, the portal's equivalent of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable value under {}: {}", key, e);
            None
        }
    }
}

pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten in full on every change.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("State file {} is corrupt ({}), starting empty", path.display(), e);
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        debug!("Opened state file {} with {} keys", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
