// Cache path utilities.
// Locates the on-disk cache directory and maps request URLs to entry files.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Get the base cache directory (~/.cache/monthly-cloud-sdk on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "monthly-cloud-sdk").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding cached HTTP responses.
pub fn responses_dir() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("responses"))
}

/// Path to the entry file for a cache key inside `dir`.
pub fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", hash_key(key)))
}

/// SHA256 of the key, hex encoded. URLs are too long and too punctuated for filenames.
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
