use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{NewTaskItem, Task, TaskItem};

/// Errors raised by a [`Store`]. Any of them aborts the unit of work.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error while reading or writing the database file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The database file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous transaction panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Everything the store persists.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Database {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub task_items: Vec<TaskItem>,
}

impl Database {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn item(&self, id: u64) -> Option<&TaskItem> {
        self.task_items.iter().find(|i| i.id == id)
    }

    /// Items belonging to `task_id`, in insertion order.
    pub fn items_of<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a TaskItem> + 'a {
        self.task_items.iter().filter(move |i| i.task_id == task_id)
    }

    fn next_item_id(&self) -> u64 {
        self.task_items.iter().map(|i| i.id).max().unwrap_or(0) + 1
    }
}

/// A unit of work against a [`Store`].
///
/// Changes are only visible to other transactions after [`Transaction::commit`].
/// Dropping a transaction without committing discards everything it staged.
pub trait Transaction {
    fn task(&self, id: &str) -> Result<Option<Task>, StoreError>;
    fn item(&self, id: u64) -> Result<Option<TaskItem>, StoreError>;

    fn insert_task(&mut self, task: Task) -> Result<(), StoreError>;
    /// Inserts an item and returns it with its assigned id.
    fn insert_item(&mut self, item: NewTaskItem) -> Result<TaskItem, StoreError>;

    /// Replaces the stored task with the same id. Returns `false` if absent.
    fn update_task(&mut self, task: &Task) -> Result<bool, StoreError>;
    /// Replaces the stored item with the same id. Returns `false` if absent.
    fn update_item(&mut self, item: &TaskItem) -> Result<bool, StoreError>;

    /// Adds one to the task's `finished_task_num`. Returns `false` if the task is absent.
    fn increment_finished_count(&mut self, task_id: &str) -> Result<bool, StoreError>;

    /// Deletes a task and all of its items. Returns `false` if absent.
    fn delete_task(&mut self, id: &str) -> Result<bool, StoreError>;
    /// Deletes a single item without touching the parent's counters.
    fn delete_item(&mut self, id: u64) -> Result<bool, StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Persistent storage for tasks and task items.
pub trait Store: Send + Sync {
    /// Starts a unit of work. Transactions on the same store are serialized.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError>;

    /// Returns a consistent copy of the committed state.
    fn snapshot(&self) -> Result<Database, StoreError>;

    /// Inserts `task` and all of `items` atomically.
    fn create_task_with_items(&self, task: Task, items: Vec<NewTaskItem>) -> Result<Vec<TaskItem>, StoreError> {
        let mut tx = self.begin()?;
        tx.insert_task(task)?;
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            inserted.push(tx.insert_item(item)?);
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Atomically adds one to a task's `finished_task_num`.
    fn increment_finished_count(&self, task_id: &str) -> Result<bool, StoreError> {
        let mut tx = self.begin()?;
        let found = tx.increment_finished_count(task_id)?;
        tx.commit()?;
        Ok(found)
    }
}

/// Returns the path to the database file.
///
/// The path is determined in the following order:
/// 1. `PRACTASK_DB` environment variable.
/// 2. `~/.local/share/practask/db.json` (on Linux).
/// 3. `./db.json` (fallback).
pub fn default_db_path() -> PathBuf {
    std::env::var("PRACTASK_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("practask");
        p.push("db.json");
        p
    })
}

/// A [`Store`] kept as a single JSON document.
///
/// Transactions hold the in-process mutex and, for a file-backed store, an
/// exclusive lock on `<path>.lock`, so separate handles and processes on the
/// same file are serialized too. Without a path the document only lives in memory.
pub struct JsonStore {
    path: Option<PathBuf>,
    state: Mutex<Database>,
}

impl JsonStore {
    /// Opens (or lazily creates) the database at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<JsonStore, StoreError> {
        let path = path.into();
        let db = load_file(&path)?;
        Ok(JsonStore { path: Some(path), state: Mutex::new(db) })
    }

    pub fn in_memory() -> JsonStore {
        JsonStore { path: None, state: Mutex::new(Database::default()) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Deletes the database file and clears the in-memory state.
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if let Some(path) = &self.path {
            let _lock = lock_file(path)?;
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        *guard = Database::default();
        Ok(())
    }
}

impl Store for JsonStore {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError> {
        let mut guard = self.lock()?;
        let lock = match &self.path {
            Some(path) => {
                let lock = lock_file(path)?;
                // Pick up writes made through other handles since the last commit.
                *guard = load_file(path)?;
                Some(lock)
            }
            None => None,
        };
        let working = guard.clone();
        Ok(Box::new(JsonTx { path: self.path.as_deref(), guard, working, _lock: lock }))
    }

    fn snapshot(&self) -> Result<Database, StoreError> {
        let mut guard = self.lock()?;
        if let Some(path) = &self.path {
            *guard = load_file(path)?;
        }
        Ok(guard.clone())
    }
}

struct JsonTx<'a> {
    path: Option<&'a Path>,
    guard: MutexGuard<'a, Database>,
    working: Database,
    _lock: Option<File>,
}

impl Transaction for JsonTx<'_> {
    fn task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.working.task(id).cloned())
    }

    fn item(&self, id: u64) -> Result<Option<TaskItem>, StoreError> {
        Ok(self.working.item(id).cloned())
    }

    fn insert_task(&mut self, task: Task) -> Result<(), StoreError> {
        self.working.tasks.push(task);
        Ok(())
    }

    fn insert_item(&mut self, item: NewTaskItem) -> Result<TaskItem, StoreError> {
        let item = item.into_item(self.working.next_item_id());
        self.working.task_items.push(item.clone());
        Ok(item)
    }

    fn update_task(&mut self, task: &Task) -> Result<bool, StoreError> {
        match self.working.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(t) => {
                *t = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_item(&mut self, item: &TaskItem) -> Result<bool, StoreError> {
        match self.working.task_items.iter_mut().find(|i| i.id == item.id) {
            Some(i) => {
                *i = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn increment_finished_count(&mut self, task_id: &str) -> Result<bool, StoreError> {
        match self.working.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(t) => {
                t.finished_task_num += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_task(&mut self, id: &str) -> Result<bool, StoreError> {
        let len_before = self.working.tasks.len();
        self.working.tasks.retain(|t| t.id != id);
        if self.working.tasks.len() == len_before {
            return Ok(false);
        }
        self.working.task_items.retain(|i| i.task_id != id);
        Ok(true)
    }

    fn delete_item(&mut self, id: u64) -> Result<bool, StoreError> {
        let len_before = self.working.task_items.len();
        self.working.task_items.retain(|i| i.id != id);
        Ok(self.working.task_items.len() != len_before)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let JsonTx { path, mut guard, working, _lock } = *self;
        if let Some(path) = path {
            save_file(path, &working)?;
            debug!(path = %path.display(), tasks = working.tasks.len(), items = working.task_items.len(), "committed");
        }
        *guard = working;
        Ok(())
    }
}

fn create_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Blocks until this handle holds the exclusive lock for `path`.
/// The lock is released when the returned file is dropped.
fn lock_file(path: &Path) -> Result<File, StoreError> {
    create_parent_dir(path)?;
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(PathBuf::from(name))?;
    file.lock_exclusive()?;
    Ok(file)
}

/// Loads the database file. A missing file is an empty database.
fn load_file(path: &Path) -> Result<Database, StoreError> {
    if !path.exists() {
        return Ok(Database::default());
    }
    let mut f = OpenOptions::new().read(true).open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(Database::default());
    }
    Ok(serde_json::from_str(&s)?)
}

/// Writes the database to a sibling temp file, then renames it into place.
fn save_file(path: &Path, db: &Database) -> Result<(), StoreError> {
    create_parent_dir(path)?;
    let s = serde_json::to_string_pretty(db)?;
    let tmp = path.with_extension("json.tmp");
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    f.write_all(s.as_bytes())?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
