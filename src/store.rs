//! Whole-file JSON persistence shared by every module.
//!
//! Each entity type lives in one pretty-printed JSON array file under the
//! data directory. Every mutation reads the full array, changes it in memory
//! and writes the full array back.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, create_dir_all};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};

use crate::error::{AppError, Result};

/// An entity stored in a [`JsonStore`], addressed by its id string.
pub trait Record: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> &str;
}

/// Where a record that is saved for the first time is placed in the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Front,
    Back,
}

/// A JSON array file holding all records of one entity type.
pub struct JsonStore<T> {
    path: PathBuf,
    insert: Insert,
    lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T: Record> JsonStore<T> {
    pub fn new(data_dir: impl AsRef<Path>, file_name: &str) -> Self {
        JsonStore {
            path: data_dir.as_ref().join(file_name),
            insert: Insert::Back,
            lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    /// New records go to the start of the array (newest first).
    pub fn inserting_at_front(mut self) -> Self {
        self.insert = Insert::Front;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and an empty array file if missing.
    pub fn ensure(&self) -> Result<()> {
        ensure_file(&self.path, "[]")
    }

    /// Read every record. Fails if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Vec<T>> {
        self.ensure()?;
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Read every record, treating an unreadable file as empty.
    pub fn list(&self) -> Vec<T> {
        match self.load() {
            Ok(records) => records,
            Err(e) => {
                log::error!("failed to read {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn find(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load()?.into_iter().find(|r| r.id() == id))
    }

    /// Insert or replace the record with the same id, then rewrite the file.
    pub fn save(&self, record: T) -> Result<T> {
        let insert = self.insert;
        self.update(|records| {
            upsert(records, record.clone(), insert);
            Ok(record)
        })
    }

    /// Remove the record with `id`. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.update(|records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            Ok(records.len() != before)
        })
    }

    /// Overwrite the whole file with `records`.
    pub fn replace_all(&self, records: &[T]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        write_json(&self.path, &records)
    }

    /// Run a read-modify-write cycle on the array.
    ///
    /// Cycles on the same store are serialized within this process. The file
    /// is only written when `f` succeeds.
    ///
    /// # Arguments
    /// * `f` - Changes the loaded records in place and returns the caller's result
    ///
    /// # Returns
    /// * `Result<R>` - What `f` returned, or the read, parse, write or `f` error
    ///
    /// # Examples
    /// ```no_run
    /// use notaris_backoffice::jobs::Job;
    /// use notaris_backoffice::store::JsonStore;
    ///
    /// let store: JsonStore<Job> = JsonStore::new("data", "daftar-pekerjaan.json");
    /// let cleared = store.update(|jobs| {
    ///     let before = jobs.len();
    ///     jobs.retain(|job| job.total_cost > 0);
    ///     Ok(before - jobs.len())
    /// });
    /// ```
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.load()?;
        let result = f(&mut records)?;
        write_json(&self.path, &records)?;
        Ok(result)
    }
}

/// Replace the record with the same id in place, or insert it at `insert`.
pub fn upsert<T: Record>(records: &mut Vec<T>, record: T, insert: Insert) {
    match records.iter().position(|r| r.id() == record.id()) {
        Some(index) => records[index] = record,
        None => match insert {
            Insert::Front => records.insert(0, record),
            Insert::Back => records.push(record),
        },
    }
}

/// A JSON file holding a single object, created with a default value on
/// first access (settings, the chat sticky note).
pub struct JsonDocument<T> {
    path: PathBuf,
    default: fn() -> T,
}

impl<T: Serialize + DeserializeOwned> JsonDocument<T> {
    pub fn new(data_dir: impl AsRef<Path>, file_name: &str, default: fn() -> T) -> Self {
        JsonDocument {
            path: data_dir.as_ref().join(file_name),
            default,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<T> {
        if !self.path.exists() {
            let value = (self.default)();
            write_json(&self.path, &value)?;
            return Ok(value);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Read the document, falling back to the default when unreadable.
    pub fn get(&self) -> T {
        match self.load() {
            Ok(value) => value,
            Err(e) => {
                log::error!("failed to read {}: {}", self.path.display(), e);
                (self.default)()
            }
        }
    }

    pub fn save(&self, value: &T) -> Result<()> {
        write_json(&self.path, value)
    }
}

fn ensure_file(path: &Path, initial: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, initial)?;
    Ok(())
}

/// Write `value` as 2-space indented JSON through a temporary file that is
/// renamed over `path`.
pub fn write_json<V: Serialize + ?Sized>(path: &Path, value: &V) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    create_dir_all(&parent)?;

    let json = serde_json::to_string_pretty(value)?;
    let mut file = tempfile::NamedTempFile::new_in(&parent)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the epoch, strictly increasing within the process so
/// that timestamp ids never collide.
pub fn next_timestamp() -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// A bare timestamp id, e.g. `1710750000000`.
pub fn timestamp_id() -> String {
    next_timestamp().to_string()
}

/// A prefixed timestamp id, e.g. `TRACK-1710750000000`.
pub fn prefixed_id(prefix: &str) -> String {
    format!("{}{}", prefix, next_timestamp())
}

pub fn uuid_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as an ISO-8601 UTC string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today's date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        value: i32,
    }

    impl Record for Item {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str, value: i32) -> Item {
        Item {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut records = vec![item("a", 1), item("b", 2)];
        upsert(&mut records, item("a", 10), Insert::Front);
        assert_eq!(records, vec![item("a", 10), item("b", 2)]);
    }

    #[test]
    fn upsert_respects_insert_position() {
        let mut records = vec![item("a", 1)];
        upsert(&mut records, item("b", 2), Insert::Front);
        upsert(&mut records, item("c", 3), Insert::Back);
        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn timestamps_are_strictly_increasing() {
        let mut last = next_timestamp();
        for _ in 0..1000 {
            let next = next_timestamp();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<Item> = JsonStore::new(dir.path().join("nested"), "items.json");
        assert!(store.load().unwrap().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn corrupt_file_is_not_clobbered_by_save() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<Item> = JsonStore::new(dir.path(), "items.json");
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.list().is_empty());
        assert!(matches!(store.save(item("a", 1)), Err(AppError::Json(_))));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }
}
