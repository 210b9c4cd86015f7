use crate::errors::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::{fs, path::PathBuf};
use tracing::{error, warn};

pub const TASKS_KEY: &str = "tasks";
pub const HISTORY_KEY: &str = "taskHistory";

/// Named string records, the way a browser's local storage holds them.
pub trait KeyValueStore: Send {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// All records in one JSON object file, rewritten on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_records(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Unreadable existing content is replaced rather than blocking every later write.
    fn read_records_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_records() {
            Ok(records) => Ok(records),
            Err(StorageError::Json(err)) => {
                warn!(
                    "overwriting malformed store {}: {err}",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
            Err(err) => Err(err),
        }
    }

    fn write_records(&self, records: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_records()?.remove(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut records = self.read_records_for_write()?;
        records.insert(key.to_string(), value.to_string());
        self.write_records(&records)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut records = self.read_records_for_write()?;
        if records.remove(key).is_some() {
            self.write_records(&records)?;
        }
        Ok(())
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
    fail_writes: bool,
    failing_keys: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, key: &str, value: &str) -> Self {
        self.records.insert(key.to_string(), value.to_string());
        self
    }

    /// Makes every later save and remove fail, as a full quota would.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Makes later saves and removes of `key` fail while other records stay writable.
    pub fn fail_writes_to(&mut self, key: &str) {
        self.failing_keys.insert(key.to_string());
    }

    fn check_writable(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes || self.failing_keys.contains(key) {
            return Err(StorageError::Unavailable("quota exceeded".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.records.remove(key);
        Ok(())
    }
}

/// Reads a JSON array record. A missing key, an unreadable store or malformed content all
/// yield an empty collection.
pub fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            error!("failed to read record {key}: {err}");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(err) => {
            error!("failed to parse record {key}: {err}");
            Vec::new()
        }
    }
}

pub fn save_collection<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let payload = serde_json::to_string(items)?;
    store.save(key, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryFlags, Task};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("daily_todo-{nanos}-{file_name}"))
    }

    fn task(id: u64, text: &str, completed: bool, categories: &[Category]) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed,
            created_at: "01/01/2025 09:00".to_string(),
            completed_at: completed.then(|| "01/01/2025 10:30".to_string()),
            categories: CategoryFlags::with(categories),
        }
    }

    #[test]
    fn task_lists_round_trip() {
        let lists = vec![
            Vec::new(),
            vec![task(1, "Buy milk", false, &[Category::Leisure])],
            vec![
                task(1, "Buy milk", true, &[Category::Leisure]),
                task(2, "File taxes", false, &[Category::Responsibility]),
                task(3, "Sketch", true, &[Category::Creation, Category::Leisure]),
                task(4, "  padded text ", false, &[]),
            ],
        ];

        for tasks in lists {
            let mut store = MemoryStore::new();
            save_collection(&mut store, TASKS_KEY, &tasks).unwrap();
            let loaded: Vec<Task> = load_collection(&store, TASKS_KEY);
            assert_eq!(loaded, tasks);
        }
    }

    #[test]
    fn missing_record_loads_empty() {
        let store = MemoryStore::new();
        let loaded: Vec<Task> = load_collection(&store, TASKS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn malformed_record_loads_empty() {
        let store = MemoryStore::new().with_record(TASKS_KEY, "{ not json");
        let loaded: Vec<Task> = load_collection(&store, TASKS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn failing_store_reports_write_errors() {
        let mut store = MemoryStore::new();
        store.fail_writes(true);
        let err = save_collection::<Task>(&mut store, TASKS_KEY, &[]).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert!(store.load(TASKS_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_keeps_records_side_by_side() {
        let path = temp_path("store.json");
        let mut store = FileStore::new(&path);
        store.save(TASKS_KEY, "[]").unwrap();
        store.save(HISTORY_KEY, "[1]").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.load(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.load(HISTORY_KEY).unwrap().as_deref(), Some("[1]"));

        store.remove(HISTORY_KEY).unwrap();
        assert!(reopened.load(HISTORY_KEY).unwrap().is_none());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let store = FileStore::new(temp_path("absent.json"));
        assert!(store.load(TASKS_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_recovers_from_corrupted_file() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "garbage").unwrap();

        let mut store = FileStore::new(&path);
        let loaded: Vec<Task> = load_collection(&store, TASKS_KEY);
        assert!(loaded.is_empty());

        store.save(TASKS_KEY, "[]").unwrap();
        assert_eq!(store.load(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        fs::remove_file(&path).ok();
    }
}
