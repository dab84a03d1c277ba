//! Local key-value persistence for the timer
//!
//! The timer is stored as one JSON value under [`STATE_KEY`]. [`FileStore`]
//! keeps a whole string-keyed map in a single file and only touches its own
//! key, so other values living in the same file survive.

use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{error::StoreError, state::timer_state::PersistedTimer};

/// Key the timer record lives under
pub const STATE_KEY: &str = "bt_tracker_state";

/// Storage for the persisted timer record
pub trait StateStore: Send + Sync {
    /// Read the stored record, if any
    fn load(&self) -> Result<Option<PersistedTimer>, StoreError>;

    /// Replace the stored record
    fn save(&self, record: &PersistedTimer) -> Result<(), StoreError>;

    /// Remove the stored record
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file holding a map of keys to values
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_slice(&data)?)
    }

    /// Read the map for an update; a corrupt file is replaced rather than blocking writes
    fn read_map_for_update(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        match self.read_map() {
            Err(StoreError::Json(e)) => {
                warn!("Store file {} is corrupt ({}), starting a fresh one", self.path.display(), e);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, map)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<PersistedTimer>, StoreError> {
        let mut map = self.read_map()?;
        match map.remove(STATE_KEY) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn save(&self, record: &PersistedTimer) -> Result<(), StoreError> {
        let mut map = self.read_map_for_update()?;
        map.insert(STATE_KEY.to_string(), serde_json::to_value(record)?);
        self.write_map(&map)?;
        debug!("Saved timer state to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut map = self.read_map_for_update()?;
        if map.remove(STATE_KEY).is_some() {
            self.write_map(&map)?;
            debug!("Cleared timer state from {}", self.path.display());
        }
        Ok(())
    }
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<PersistedTimer>>,
    unavailable: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, like a full or disabled browser store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("storage quota exceeded"));
        }
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedTimer>, StoreError> {
        self.record
            .lock()
            .map(|record| record.clone())
            .map_err(|e| StoreError::unavailable(format!("Failed to lock memory store: {}", e)))
    }

    fn save(&self, record: &PersistedTimer) -> Result<(), StoreError> {
        self.check_available()?;
        let mut stored = self
            .record
            .lock()
            .map_err(|e| StoreError::unavailable(format!("Failed to lock memory store: {}", e)))?;
        *stored = Some(record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check_available()?;
        let mut stored = self
            .record
            .lock()
            .map_err(|e| StoreError::unavailable(format!("Failed to lock memory store: {}", e)))?;
        *stored = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record(elapsed: i64) -> PersistedTimer {
        PersistedTimer {
            is_running: true,
            start_time: Some(1_000),
            elapsed,
            description: "Model box".to_string(),
        }
    }

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_returns_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/state.json"));

        store.save(&record(5_000)).unwrap();
        assert_eq!(store.load().unwrap(), Some(record(5_000)));

        store.save(&record(6_000)).unwrap();
        assert_eq!(store.load().unwrap(), Some(record(6_000)));
    }

    #[test]
    fn other_keys_survive_save_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
        let store = FileStore::new(&path);

        store.save(&record(1)).unwrap();
        store.clear().unwrap();

        let map: BTreeMap<String, Value> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(map.get("theme"), Some(&Value::from("dark")));
        assert!(!map.contains_key(STATE_KEY));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_errors_on_load_but_not_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);

        assert_matches!(store.load(), Err(StoreError::Json(_)));

        store.save(&record(2)).unwrap();
        assert_eq!(store.load().unwrap(), Some(record(2)));
    }

    #[test]
    fn empty_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(FileStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn null_value_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"bt_tracker_state": null}"#).unwrap();
        assert_eq!(FileStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn unavailable_memory_store_rejects_writes() {
        let store = MemoryStore::new();
        store.save(&record(1)).unwrap();
        store.set_unavailable(true);

        assert_matches!(store.save(&record(2)), Err(StoreError::Unavailable { .. }));
        assert_matches!(store.clear(), Err(StoreError::Unavailable { .. }));
        assert_eq!(store.load().unwrap(), Some(record(1)));
        assert_eq!(store.save_count(), 1);
    }
}
