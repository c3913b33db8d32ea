//! Durable sheet storage
//!
//! Sheets are stored whole, one JSON blob per sheet name, through a
//! [`KeyValueStore`]. Saving always replaces the entire structure
//! (last writer wins); [`SheetStore::with_sheet`] offers a per-sheet critical
//! section for callers that need read-modify-write to be exclusive.

use crate::config::SheetsConfig;
use crate::sheet::Sheet;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid sheet key: {0:?}")]
    InvalidKey(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Blob storage keyed by sheet name; each `put` must be atomic per key
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, blob: &str) -> Result<()>;
}

/// One `<key>.json` file per sheet inside a directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open (and create if needed) the data directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.path_for(key)?;
        atomic_write(&path, blob.as_bytes())?;
        Ok(())
    }
}

/// Replace `dest` with `bytes` through a uniquely named sibling temp file.
///
/// Concurrent writers never share a temp file; readers see either the old or
/// the new content. The temp file is removed if anything fails before the
/// rename.
pub fn atomic_write(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Process-local store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let blobs = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn put(&self, key: &str, blob: &str) -> Result<()> {
        validate_key(key)?;
        let mut blobs = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Sheet names double as file names, so they cannot escape the data directory
fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Typed sheet access on top of a [`KeyValueStore`]
pub struct SheetStore<S> {
    backend: S,
    layout: SheetsConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: KeyValueStore> SheetStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_layout(backend, SheetsConfig::default())
    }

    /// Store whose never-saved sheets use a configured title and headers
    pub fn with_layout(backend: S, layout: SheetsConfig) -> Self {
        Self {
            backend,
            layout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Whether the sheet has ever been saved
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.backend.get(name)?.is_some())
    }

    /// Load the sheet, or the default empty layout when it was never saved
    pub fn load(&self, name: &str) -> Result<Sheet> {
        match self.backend.get(name)? {
            Some(blob) => {
                let sheet: Sheet = serde_json::from_str(&blob)?;
                log::debug!("Loaded sheet '{}' ({} rows)", name, sheet.rows.len());
                Ok(sheet)
            }
            None => {
                log::debug!("Sheet '{}' not found, using default layout", name);
                Ok(Sheet::with_layout(
                    name,
                    &self.layout.default_title,
                    self.layout.default_headers.iter().map(String::as_str),
                ))
            }
        }
    }

    /// Replace the whole persisted sheet
    pub fn save(&self, name: &str, sheet: &Sheet) -> Result<()> {
        let blob = serde_json::to_string_pretty(sheet)?;
        self.backend.put(name, &blob)?;
        log::debug!("Saved sheet '{}' ({} rows)", name, sheet.rows.len());
        Ok(())
    }

    /// Load, mutate and save a sheet while holding that sheet's lock.
    /// The sheet is saved even when `f` leaves it unchanged.
    pub fn with_sheet<T>(&self, name: &str, f: impl FnOnce(&mut Sheet) -> T) -> Result<T> {
        let lock = self.lock_for(name)?;
        let _guard = lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut sheet = self.load(name)?;
        let out = f(&mut sheet);
        self.save(name, &sheet)?;
        Ok(out)
    }

    fn lock_for(&self, name: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(locks.entry(name.to_string()).or_default().clone())
    }
}
