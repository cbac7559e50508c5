// Filesystem cache store.
// One JSON file per key, written atomically via a temp file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{Result, SdkError};

use super::paths;
use super::store::{CacheStore, CachedData};

/// Cache store that persists responses as JSON files under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store entries under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store entries under the platform cache directory.
    pub fn in_cache_dir() -> Result<Self> {
        let dir = paths::responses_dir()
            .ok_or_else(|| SdkError::MissingConfig("platform cache directory".to_string()))?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, path: &Path) -> Result<Option<CachedData<Value>>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cached: CachedData<Value> = serde_json::from_str(&contents)?;
        Ok(Some(cached))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = paths::entry_path(&self.dir, key);
        match self.read(&path)? {
            Some(cached) if cached.is_valid() => Ok(Some(cached.data)),
            Some(_) => {
                remove_entry(&path)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = paths::entry_path(&self.dir, key);
        let json = serde_json::to_string(&CachedData::new(value, ttl))?;

        // Write atomically via a temp file unique to this writer
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;

        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool> {
        remove_entry(&paths::entry_path(&self.dir, key))
    }
}

/// Remove an entry file. A file already removed by another writer is not an error.
fn remove_entry(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
