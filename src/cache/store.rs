//! Cache store for persisting resource documents to disk
//!
//! Provides a `CacheStore` that keeps one pretty-printed JSON document per
//! resource, named `<resource_name>.json`, inside a single cache directory.
//! Writes go to a temporary file in the same directory and are renamed into
//! place, so readers never observe a half-written document.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// No document exists for the resource
    #[error("cache file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document exists but is not valid JSON
    #[error("invalid JSON in {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem error while reading or writing
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Content could not be serialized
    #[error("failed to serialize content: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The resource name cannot be used as a file stem
    #[error("invalid resource name: '{0}'")]
    InvalidName(String),
}

/// A JSON file found in the cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheFile {
    /// File name, including the `.json` extension
    pub file_name: String,
    /// Size on disk in bytes
    pub byte_size: u64,
}

/// Manages reading and writing resource documents on disk
///
/// The store owns the on-disk representation. Directory creation is
/// idempotent, and writes for the same resource name are serialized within
/// the process.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where resource documents are stored
    cache_dir: PathBuf,
    /// One write lock per resource name
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CacheStore {
    /// Creates a new CacheStore rooted at `cache_dir`
    ///
    /// The directory is not created until the first write.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the directory this store writes to
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of the document for `name`
    ///
    /// Names are restricted to ASCII letters, digits, `_` and `-` so they can
    /// never escape the cache directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, CacheError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CacheError::InvalidName(name.to_string()));
        }
        Ok(self.cache_dir.join(format!("{}.json", name)))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheError::Io {
            path: self.cache_dir.clone(),
            source,
        })
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    /// Reads the raw bytes of a resource document
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` with the file contents
    /// * `Err(CacheError::NotFound)` if the file is absent
    /// * `Err(CacheError::Io)` for any other read failure
    pub fn read_raw(&self, name: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.path_for(name)?;
        fs::read(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                CacheError::NotFound(path)
            } else {
                CacheError::Io { path, source }
            }
        })
    }

    /// Loads and parses a resource document
    ///
    /// # Returns
    /// * `Ok(Value)` if the document exists and is valid JSON
    /// * `Err(CacheError::NotFound)` if it is absent
    /// * `Err(CacheError::Decode)` if it is not valid JSON
    pub fn load(&self, name: &str) -> Result<Value, CacheError> {
        let path = self.path_for(name)?;
        let bytes = self.read_raw(name)?;
        serde_json::from_slice(&bytes).map_err(|source| CacheError::Decode { path, source })
    }

    /// Writes a resource document, replacing any previous one atomically
    ///
    /// The content is serialized as JSON with 2-space indentation. The cache
    /// directory and any missing parents are created first.
    pub fn save(&self, name: &str, content: &Value) -> Result<(), CacheError> {
        let path = self.path_for(name)?;
        let json = serde_json::to_vec_pretty(content)?;

        let lock = self.lock_for(name);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        self.ensure_dir()?;

        let io_err = |source: io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.cache_dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!(resource = name, bytes = json.len(), "wrote cache file");
        Ok(())
    }

    /// Lists every `.json` file in the cache directory, sorted by name
    ///
    /// Returns an empty list if the directory does not exist yet.
    pub fn list_files(&self) -> Result<Vec<CacheFile>, CacheError> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.cache_dir.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(".json") {
                continue;
            }
            // Files can vanish between listing and stat; skip them.
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.is_file() {
                files.push(CacheFile {
                    file_name,
                    byte_size: metadata.len(),
                });
            }
        }
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }
}
