//! Whole-collection persistence for the case universe.
//!
//! The engine never updates a single case in place: it loads the full
//! [`DbSchema`], mutates it in memory and saves it back. Concurrent writers are
//! not coordinated; the `revision` counter only lets a store refuse a save
//! whose snapshot is stale instead of silently discarding the other write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::types::DbSchema;

/// Errors specific to case store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Case store not initialized at {0}")]
    NotInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Revision conflict: snapshot is at {expected}, store is at {found}")]
    RevisionConflict { expected: u64, found: u64 },
}

/// Load/save access to the whole case collection.
pub trait CaseStore: Send + Sync {
    fn load(&self) -> Result<DbSchema, StoreError>;

    /// Persist `db`, which must carry the revision it was loaded at.
    /// Returns the new revision.
    fn save(&self, db: &DbSchema) -> Result<u64, StoreError>;
}

fn check_revision(expected: u64, found: u64) -> Result<(), StoreError> {
    if expected != found {
        return Err(StoreError::RevisionConflict { expected, found });
    }
    Ok(())
}

// =============================================================================
// JSON file store
// =============================================================================

/// Stores the collection as a single pretty-printed JSON document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<DbSchema, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write `db` unconditionally, replacing whatever is on disk.
    pub fn overwrite(&self, db: &DbSchema) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent)?;
        }

        let content = serde_json::to_string_pretty(db)?;
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl CaseStore for JsonFileStore {
    fn load(&self) -> Result<DbSchema, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotInitialized(self.path.clone()));
        }
        self.read()
    }

    fn save(&self, db: &DbSchema) -> Result<u64, StoreError> {
        if self.path.exists() {
            let current = self.read()?;
            check_revision(db.revision, current.revision)?;
        }

        let mut next = db.clone();
        next.revision = db.revision + 1;
        self.overwrite(&next)?;
        log::debug!(
            "Saved {} cases to {} (revision {})",
            next.cases.len(),
            self.path.display(),
            next.revision
        );
        Ok(next.revision)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store. Used by tests and by embedders that persist elsewhere.
pub struct MemoryStore {
    db: Mutex<DbSchema>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(db: DbSchema) -> Self {
        Self {
            db: Mutex::new(db),
            saves: Mutex::new(0),
        }
    }

    /// Current stored collection.
    pub fn snapshot(&self) -> DbSchema {
        self.db.lock().clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl CaseStore for MemoryStore {
    fn load(&self) -> Result<DbSchema, StoreError> {
        Ok(self.db.lock().clone())
    }

    fn save(&self, db: &DbSchema) -> Result<u64, StoreError> {
        let mut guard = self.db.lock();
        check_revision(db.revision, guard.revision)?;
        let mut next = db.clone();
        next.revision = db.revision + 1;
        *guard = next;
        *self.saves.lock() += 1;
        Ok(guard.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use chrono::NaiveDate;

    fn empty_db() -> DbSchema {
        DbSchema::new(VirtualClock::at_date(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ))
    }

    #[test]
    fn test_json_store_reports_uninitialized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("db.json"));
        assert!(matches!(store.load(), Err(StoreError::NotInitialized(_))));
    }

    #[test]
    fn test_json_store_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("nested").join("db.json"));

        let rev = store.save(&empty_db()).expect("first save");
        assert_eq!(rev, 1);

        let loaded = store.load().expect("load");
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.virtual_date, empty_db().virtual_date);

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\"virtualDate\""));
    }

    #[test]
    fn test_json_store_rejects_stale_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("db.json"));
        store.save(&empty_db()).expect("seed");

        let first = store.load().unwrap();
        let second = store.load().unwrap();
        store.save(&first).expect("first writer wins");

        match store.save(&second) {
            Err(StoreError::RevisionConflict { expected, found }) => {
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_overwrite_ignores_revision() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("db.json"));
        store.save(&empty_db()).unwrap();
        store.save(&store.load().unwrap()).unwrap();

        store.overwrite(&empty_db()).expect("overwrite");
        assert_eq!(store.load().unwrap().revision, 0);
    }

    #[test]
    fn test_memory_store_counts_saves_and_checks_revision() {
        let store = MemoryStore::new(empty_db());
        let db = store.load().unwrap();
        store.save(&db).expect("save");
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot().revision, 1);

        assert!(matches!(
            store.save(&db),
            Err(StoreError::RevisionConflict { .. })
        ));
        assert_eq!(store.save_count(), 1);
    }
}
