use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::snapshot::Snapshot;

pub const SNAPSHOT_FILE: &str = "priority.json";

/// Error type for snapshot persistence
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize snapshot: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Where the session document lives
pub trait SnapshotStore {
    /// `Ok(None)` when no document has been written yet
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError>;

    /// Merge-style upsert: the snapshot's keys overwrite the stored ones and
    /// any other top-level keys already in the document survive.
    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
}

/// Overlay the snapshot's keys onto an existing document.
pub fn merge_document(existing: Option<Value>, snapshot: &Snapshot) -> Result<Value, SnapshotError> {
    let mut doc = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Value::Object(fields) = serde_json::to_value(snapshot)? {
        doc.extend(fields);
    }
    Ok(Value::Object(doc))
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// `<data_dir>/priority.json`, written atomically
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn read_raw(&self) -> Result<Option<String>, SnapshotError> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::ReadError { path, source: e }),
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let Some(text) = self.read_raw()? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let path = self.path();
        serde_json::from_str(&text).map(Some).map_err(|e| {
            recovery::log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryCategory::Parse, "snapshot could not be parsed")
                    .field("File", path.display())
                    .field("Error", &e)
                    .body(text.clone()),
            );
            SnapshotError::ParseError { path, source: e }
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let path = self.path();
        // An unreadable existing document is replaced rather than merged
        let existing = self
            .read_raw()
            .ok()
            .flatten()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());
        let doc = merge_document(existing, snapshot)?;
        let body = serde_json::to_string_pretty(&doc)?;

        recovery::atomic_write(&path, body.as_bytes()).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "snapshot save failed");
            recovery::log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryCategory::Write, "snapshot save failed")
                    .field("File", path.display())
                    .field("Error", &e)
                    .body(body.clone()),
            );
            SnapshotError::WriteError {
                path: path.clone(),
                source: e,
            }
        })?;
        tracing::debug!(path = %path.display(), bytes = body.len(), "snapshot saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// A document held in memory. Can be told to fail, to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: RefCell<Option<Value>>,
    fail_load: Cell<bool>,
    fail_save: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Value) -> Self {
        let store = Self::default();
        store.doc.replace(Some(doc));
        store
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.set(fail);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.set(fail);
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    pub fn document(&self) -> Option<Value> {
        self.doc.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        if self.fail_load.get() {
            return Err(SnapshotError::Unavailable("load refused".into()));
        }
        match self.doc.borrow().as_ref() {
            Some(doc) => Ok(Some(serde_json::from_value(doc.clone())?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if self.fail_save.get() {
            return Err(SnapshotError::Unavailable("save refused".into()));
        }
        let merged = merge_document(self.doc.borrow().clone(), snapshot)?;
        self.doc.replace(Some(merged));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        (**self).save(snapshot)
    }
}
