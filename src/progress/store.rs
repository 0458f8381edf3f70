//! Key-value persistence port for cooking progress.
//!
//! Values are JSON strings under a small fixed key space, so a store can be backed by
//! anything that maps strings to strings. Corrupt values read back as absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::recipe_parser::RecipeKey;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Backend bearer token.
    Token,
    /// Last language the user picked for cooking.
    CookingLang,
    /// Snapshot of the most recent cooking session.
    CookingProgress,
    /// Durable per-recipe progress.
    RecipeProgress(RecipeKey),
}

impl StorageKey {
    pub fn as_key(&self) -> String {
        match self {
            StorageKey::Token => "token".to_string(),
            StorageKey::CookingLang => "cookingLang".to_string(),
            StorageKey::CookingProgress => "cookingProgress".to_string(),
            StorageKey::RecipeProgress(key) => format!("cookingProgress_{}", key),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

pub trait ProgressStore {
    fn get(&self, key: &StorageKey) -> Option<String>;
    fn set(&mut self, key: &StorageKey, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError>;

    /// Reads and decodes a JSON value; undecodable data is treated as missing.
    fn load<T: DeserializeOwned>(&self, key: &StorageKey) -> Option<T>
    where
        Self: Sized,
    {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "ignoring corrupt stored value");
                None
            }
        }
    }

    fn save<T: Serialize>(&mut self, key: &StorageKey, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw)
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for &mut S {
    fn get(&self, key: &StorageKey) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &StorageKey, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &StorageKey) -> Option<String> {
        self.entries.get(&key.as_key()).cloned()
    }

    fn set(&mut self, key: &StorageKey, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.as_key(), value);
        Ok(())
    }

    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError> {
        self.entries.remove(&key.as_key());
        Ok(())
    }
}

/// All keys live in one JSON object on disk.
///
/// Every operation re-reads the file, so two handles on the same path see each other's
/// writes; concurrent writers to the same key race and the last write wins.
#[derive(Debug, Clone)]
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

    fn read_entries(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read store");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "store file is corrupt, starting empty"
            );
            BTreeMap::new()
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(entries)?;
        atomic_write(&self.path, &content)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn get(&self, key: &StorageKey) -> Option<String> {
        self.read_entries().remove(&key.as_key())
    }

    fn set(&mut self, key: &StorageKey, value: String) -> Result<(), StoreError> {
        let mut entries = self.read_entries();
        entries.insert(key.as_key(), value);
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError> {
        let mut entries = self.read_entries();
        if entries.remove(&key.as_key()).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Write to a sibling temp file, fsync, then rename over the target.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let temp_path = path.with_file_name(format!(
        ".{}.tmp.{}",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id()
    ));

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    #[cfg(unix)]
    {
        if let Ok(dir) = File::open(&parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
