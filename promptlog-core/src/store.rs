//! # Key-value stores
//!
//! Durable string stores used by [`PromptStorageService`](crate::storage_service::PromptStorageService).
//!
//! - [`KeyValueStore`] trait - `get`/`set`/`remove` over string keys and values.
//! - [`MemoryStore`] - a `HashMap` store, useful for tests and embedding.
//! - [`FileStore`] - one JSON file per key in a base directory.

use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error;
use std::fs::create_dir_all;
use std::io::Write;
use std::path::PathBuf;
use std::{fmt, fs, io};
use tempfile::NamedTempFile;
use tracing::debug;

pub trait KeyValueStore {
    type Error: Error + Send + Sync + 'static;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
    fn remove(&mut self, key: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Infallible> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Infallible> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug)]
pub enum FileStoreError {
    IoError(io::Error),
    InvalidBasePath(String),
    InvalidKey(String),
}

impl fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStoreError::IoError(err) => write!(f, "IO error: {}", err),
            FileStoreError::InvalidBasePath(path) => write!(f, "Invalid base path: {}", path),
            FileStoreError::InvalidKey(key) => write!(
                f,
                "Invalid key, only letters, digits, '_', '-' and '.' are allowed: {}",
                key
            ),
        }
    }
}

impl Error for FileStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FileStoreError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FileStoreError {
    fn from(err: io::Error) -> Self {
        FileStoreError::IoError(err)
    }
}

/// A local file store.
///
/// Every key is saved as `<key>.json` in the base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// The base directory where values are stored.
    pub base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        FileStore {
            base_path: base_path.into(),
        }
    }

    pub fn ensure_base_directory_exists(&self) -> Result<(), FileStoreError> {
        if !self.base_path.exists() {
            create_dir_all(&self.base_path)?;
        } else if !self.base_path.is_dir() {
            return Err(FileStoreError::InvalidBasePath(
                self.base_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, FileStoreError> {
        if !is_key_valid(key) {
            return Err(FileStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - If nothing was stored under `key` yet.
    /// * `FileStoreError::InvalidBasePath` - If `base_path` exists but is not a directory.
    fn get(&self, key: &str) -> Result<Option<String>, FileStoreError> {
        let file_path = self.key_path(key)?;
        if self.base_path.exists() && !self.base_path.is_dir() {
            return Err(FileStoreError::InvalidBasePath(
                self.base_path.display().to_string(),
            ));
        }
        if !file_path.exists() {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(file_path)?))
    }

    /// Writes `value` under `key`, creating `base_path` first if needed.
    ///
    /// The value goes to a temporary file in `base_path` which is then renamed over
    /// `<key>.json`, so an interrupted write leaves the previous value intact.
    fn set(&mut self, key: &str, value: &str) -> Result<(), FileStoreError> {
        let file_path = self.key_path(key)?;
        self.ensure_base_directory_exists()?;

        debug!(path = %file_path.display(), bytes = value.len(), "Writing store file");
        let mut temp_file = NamedTempFile::new_in(&self.base_path)?;
        temp_file.write_all(value.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(file_path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Deletes the value under `key`. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), FileStoreError> {
        let file_path = self.key_path(key)?;
        if file_path.exists() {
            fs::remove_file(file_path)?;
        }
        Ok(())
    }
}

fn is_key_valid(key: &str) -> bool {
    if key.is_empty() || key.len() > 128 || key.starts_with('.') {
        return false;
    }

    key.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
}
