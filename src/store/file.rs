//! File-backed cache store
//!
//! Each slot is a file named by the SHA256 of its key, so keys containing
//! path separators or other unsafe characters map to flat, fixed-length
//! names.

use super::CacheStore;
use crate::error::{LoaderError, LoaderResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory of one file per slot
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> LoaderResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| LoaderError::io(format!("creating cache directory {}", dir.display()), e))?;
        Ok(Self { dir })
    }

    /// Open a store without creating the directory
    ///
    /// Reads from a missing directory are simply misses.
    pub fn existing(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(hex::encode(hasher.finalize()))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read cache slot {} ({}): {}", key, path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> LoaderResult<()> {
        let path = self.slot_path(key);
        let tmp = path.with_extension(format!(
            "tmp-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        let write = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        write.map_err(|source| {
            let _ = fs::remove_file(&tmp);
            LoaderError::CacheWrite {
                key: key.to_string(),
                source,
            }
        })
    }
}
