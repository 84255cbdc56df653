//! Key-value persistence for the todo collection.
//!
//! Only the collection survives a restart; filters, pagination and loading
//! flags are rebuilt from defaults. The collection is stored under
//! [`TODOS_KEY`] as a versioned JSON envelope.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::Todo;

pub const TODOS_KEY: &str = "todos";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("could not access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("stored todos are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("stored todos use unsupported format version {0}")]
    UnsupportedVersion(u32),
}

/// A string-to-string store. Implementations decide durability.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// One `<key>.json` file per key inside `dir`, replaced atomically.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| PersistError::Io { path: dir.clone(), source })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes()).map_err(|source| PersistError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Io { path, source }),
        }
    }
}

/// Process-local storage, handy for tests and hosts without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    todos: T,
}

pub fn save_todos(storage: &dyn KeyValueStorage, todos: &[Todo]) -> Result<(), PersistError> {
    let json = serde_json::to_string(&Envelope { version: FORMAT_VERSION, todos })?;
    storage.set(TODOS_KEY, &json)?;
    debug!(count = todos.len(), "todos persisted");
    Ok(())
}

/// `Ok(None)` when nothing has been stored yet.
pub fn load_todos(storage: &dyn KeyValueStorage) -> Result<Option<Vec<Todo>>, PersistError> {
    let Some(json) = storage.get(TODOS_KEY)? else {
        return Ok(None);
    };
    let envelope: Envelope<Vec<Todo>> = serde_json::from_str(&json)?;
    if envelope.version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(envelope.version));
    }
    info!(count = envelope.todos.len(), "todos rehydrated");
    Ok(Some(envelope.todos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn todo(id: &str) -> Todo {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        Todo {
            id: id.into(),
            name: format!("Todo {id}"),
            description: None,
            due_date: None,
            time: Some("07:15".into()),
            completed: id == "2",
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn file_storage_saves_and_loads_todos() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("nested")).unwrap();
        let todos = vec![todo("1"), todo("2")];
        save_todos(&storage, &todos).unwrap();
        assert!(dir.path().join("nested/todos.json").exists());
        assert_eq!(load_todos(&storage).unwrap(), Some(todos));
    }

    #[test]
    fn missing_key_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(load_todos(&storage).unwrap().is_none());
        storage.remove(TODOS_KEY).unwrap();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        fs::write(dir.path().join("todos.json"), "not json {{{").unwrap();
        assert!(matches!(load_todos(&storage), Err(PersistError::Corrupt(_))));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let storage = MemoryStorage::new();
        storage.set(TODOS_KEY, r#"{"version":99,"todos":[]}"#).unwrap();
        assert!(matches!(load_todos(&storage), Err(PersistError::UnsupportedVersion(99))));
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(matches!(storage.set("../evil", "x"), Err(PersistError::InvalidKey(_))));
        assert!(matches!(storage.get(""), Err(PersistError::InvalidKey(_))));
    }

    #[test]
    fn overwrite_replaces_previous_value() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        save_todos(&storage, &[todo("1"), todo("2")]).unwrap();
        save_todos(&storage, &[todo("3")]).unwrap();
        let loaded = load_todos(&storage).unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "3");
    }
}
