//! Local key-value storage.
//!
//! Persistence is abstracted behind [`KeyValueStore`] so callers never touch
//! a global. [`LocalStorage`] adds typed collection save/load on top and
//! degrades to no-ops when no backend is available.
//!
//! ```text
//! LocalStorage
//! ├── backend: Option<Arc<dyn KeyValueStore>>   (None = storage unavailable)
//! │     ├── FileStore   (one JSON object file, written wholesale)
//! │     └── MemoryStore (tests)
//! └── RecordCollection<T> (id-keyed, insertion-ordered, write-through)
//! ```

mod collection;
mod file;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use collection::RecordCollection;
pub use file::FileStore;

use crate::config::StorageConfig;
use crate::error::StoreError;

/// Storage keys shared with the web front-end.
pub mod keys {
    pub const AUTH_TOKEN: &str = "token";
    pub const USER_ROLE: &str = "userType";
    pub const REPORTS: &str = "reports";
    pub const REMINDERS: &str = "reminders";
    pub const DISPUTES: &str = "disputes";
    pub const DOCUMENTS: &str = "documents";
    /// Chat history is kept per role: `chatMessages:<role>`.
    pub const CHAT_HISTORY_PREFIX: &str = "chatMessages";
}

/// Minimal string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Io {
            path: "memory".to_string(),
            reason: "memory store lock poisoned".to_string(),
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Io {
            path: "memory".to_string(),
            reason: "memory store lock poisoned".to_string(),
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Io {
            path: "memory".to_string(),
            reason: "memory store lock poisoned".to_string(),
        })?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed adapter over an optional [`KeyValueStore`].
#[derive(Clone, Default)]
pub struct LocalStorage {
    backend: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("available", &self.is_available())
            .finish()
    }
}

impl LocalStorage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Storage that persists nothing and loads nothing.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        if !config.enabled {
            tracing::debug!("Local storage disabled by configuration");
            return Self::unavailable();
        }
        Self::new(Arc::new(FileStore::new(config.path.clone())))
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Encode and store a whole collection. No-op without a backend.
    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), StoreError> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let encoded = serde_json::to_string(records).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        backend.set(key, &encoded)
    }

    /// Load a whole collection.
    ///
    /// Returns an empty collection when storage is unavailable, the key is
    /// absent, the backend fails, or the stored value does not decode. The
    /// last two cases are logged.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };

        let raw = match backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read stored collection");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Stored collection is malformed; treating it as empty"
                );
                Vec::new()
            }
        }
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        match &self.backend {
            Some(backend) => backend.get(key),
            None => Ok(None),
        }
    }

    /// Store a raw value. Unlike [`Self::save`], this reports a missing backend.
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match &self.backend {
            Some(backend) => backend.set(key, value),
            None => Err(StoreError::Unavailable),
        }
    }

    pub fn remove_value(&self, key: &str) -> Result<(), StoreError> {
        match &self.backend {
            Some(backend) => backend.remove(key),
            None => Ok(()),
        }
    }
}
