//! Storage layer for agenda
//!
//! State lives in a key-value store. On disk each key is one JSON file in
//! the data directory:
//!
//! ```text
//! <data_dir>/
//!   agenda.toml          # Optional configuration
//!   tasks.json           # @tasks     - JSON array of every task
//!   user.json            # @user      - the single registered user
//!   session.json         # @session   - username currently logged in
//!   reminders.json       # @reminders - pending reminders (notification outbox)
//! ```
//!
//! Writes are atomic (temp + rename) under a per-file lock. There is no
//! schema versioning and the last writer wins.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

pub const TASKS_KEY: &str = "@tasks";
pub const USER_KEY: &str = "@user";
pub const SESSION_KEY: &str = "@session";
pub const REMINDERS_KEY: &str = "@reminders";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "AGENDA_DIR";

/// Platform data directory used when none is given.
pub fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "agenda")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "cannot determine a data directory; pass --data-dir or set {DATA_DIR_ENV}"
            ))
        })
}

/// String key-value storage, the shape of a device's local store.
pub trait KeyValueStore {
    /// Raw value under `key`, `None` when the key was never written.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// Key-value store backed by one JSON file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Path to the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key` (`@tasks` -> `<root>/tasks.json`)
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        let name = key.trim_start_matches('@');
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(Error::InvalidArgument(format!("invalid storage key '{key}'")));
        }
        Ok(self.root.join(format!("{name}.json")))
    }

    /// Create the data directory if needed
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        lock::write_atomic_locked(&path, value.as_bytes(), self.lock_timeout_ms)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        lock::remove_locked(&path, self.lock_timeout_ms)
    }
}

/// In-process key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read and parse the JSON value under `key`.
///
/// A parse failure is reported as [`Error::CorruptData`], distinct from an
/// I/O failure of the store itself.
pub fn read_json<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.get_item(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| Error::CorruptData {
            key: key.to_string(),
            code: "JSON_PARSE_ERROR",
            message: err.to_string(),
        })
}

/// Serialize `value` and store it under `key`, replacing what was there.
pub fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value)?;
    store.set_item(key, &json)
}

/// Persistence adapter for the task collection
#[derive(Debug, Clone)]
pub struct TaskStore<S> {
    store: S,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All persisted tasks; empty when nothing was saved yet.
    pub fn load(&self) -> Result<Vec<Task>> {
        Ok(read_json(&self.store, TASKS_KEY)?.unwrap_or_default())
    }

    /// Overwrite the whole collection.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        write_json(&self.store, TASKS_KEY, tasks)?;
        tracing::debug!(count = tasks.len(), "saved tasks");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove_item(TASKS_KEY)
    }
}
