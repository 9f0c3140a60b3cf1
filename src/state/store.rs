//! Persistent key/value storage for the token/user pair.
//!
//! SYSTEM CONTEXT
//! ==============
//! The pair survives reloads (in the browser) or process restarts (in the CLI).
//! Only `SessionManager` reads or writes it; every other component reads the
//! in-memory session.
//!
//! INVARIANT
//! =========
//! The two keys are written together and cleared together. A half-written
//! pair is rolled back, and a half-present pair found at load time is cleared.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::StorageKeys;
use crate::net::types::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store refused the operation (quota, permissions, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored value for '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// String key/value storage with tab-lifetime or longer persistence.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write several entries. Stores that can write atomically override this.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// PAIR HELPERS
// =============================================================================

/// Persist `user` and `token` under `keys`. On failure nothing is left behind.
///
/// # Errors
///
/// Returns the store error after rolling back any partial write.
pub fn persist_pair(store: &dyn SessionStore, keys: &StorageKeys, user: &User, token: &str) -> Result<(), StoreError> {
    let user_json = serde_json::to_string(user)
        .map_err(|e| StoreError::Corrupt { key: keys.user.clone(), reason: e.to_string() })?;
    if let Err(e) = store.set_many(&[(keys.token.as_str(), token), (keys.user.as_str(), user_json.as_str())]) {
        if let Err(rollback) = clear_pair(store, keys) {
            tracing::error!(error = %rollback, "rollback of partial session write failed");
        }
        return Err(e);
    }
    Ok(())
}

/// Load the persisted pair. `Ok(None)` when neither key is present.
///
/// # Errors
///
/// Returns `StoreError::Corrupt` when only one key is present or the user JSON
/// does not parse; callers are expected to clear the pair.
pub fn load_pair(store: &dyn SessionStore, keys: &StorageKeys) -> Result<Option<(User, String)>, StoreError> {
    let token = store.get(&keys.token)?.filter(|t| !t.is_empty());
    let user_json = store.get(&keys.user)?;
    match (user_json, token) {
        (None, None) => Ok(None),
        (Some(json), Some(token)) => {
            let user = serde_json::from_str::<User>(&json)
                .map_err(|e| StoreError::Corrupt { key: keys.user.clone(), reason: e.to_string() })?;
            Ok(Some((user, token)))
        }
        (None, Some(_)) => Err(StoreError::Corrupt { key: keys.user.clone(), reason: "missing".to_owned() }),
        (Some(_), None) => Err(StoreError::Corrupt { key: keys.token.clone(), reason: "missing".to_owned() }),
    }
}

/// Remove both keys, attempting the second even if the first fails.
///
/// # Errors
///
/// Returns the first store error encountered.
pub fn clear_pair(store: &dyn SessionStore, keys: &StorageKeys) -> Result<(), StoreError> {
    let token = store.remove(&keys.token);
    let user = store.remove(&keys.user);
    token.and(user)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store with the lifetime of the owning manager, the equivalent
/// of tab-scoped browser storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_owned())
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON object on disk. Every write rewrites the file through a temporary
/// sibling and a rename, so a pair written with `set_many` lands atomically.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
                key: self.path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::Unavailable(e.to_string())),
            };
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        let text = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let tmp = self.path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        std::fs::write(&tmp, text).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        // A corrupt file must still be clearable.
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StoreError::Corrupt { .. }) => HashMap::new(),
            Err(e) => return Err(e),
        };
        entries.remove(key);
        self.write_all(&entries)
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_owned(), (*value).to_owned());
            }
        })
    }
}
