//! Content-addressed scratch area for memoized generation results.
//!
//! Each batch run opens a fresh temporary directory, stores one bincode file
//! per `(strategy, arguments)` key and removes the directory once all tasks
//! have joined. Nothing here survives a batch run.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{NamedTempFile, TempDir};

/// SHA-256 digest of a generation call, hex encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(tag: &str, material: &[u8], size: usize, seed: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((tag.len() as u64).to_le_bytes());
        hasher.update(tag.as_bytes());
        hasher.update((material.len() as u64).to_le_bytes());
        hasher.update(material);
        hasher.update((size as u64).to_le_bytes());
        hasher.update(seed.to_le_bytes());
        CacheKey(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Per-batch memoization directory.
pub struct ScratchCache {
    dir: TempDir,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ScratchCache {
    /// Create a fresh scratch directory under `parent`, creating `parent` if
    /// needed.
    pub fn create_in(parent: &Path) -> Result<Self> {
        fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("phonosynth-")
            .tempdir_in(parent)?;
        tracing::debug!(path = %dir.path().display(), "opened scratch cache");
        Ok(Self {
            dir,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        })
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.path().join(format!("{}.bin", key.as_str()))
    }

    /// Stored value for `key`, if any.
    pub fn load<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(bincode::deserialize(&bytes)?))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store `value` under `key`. The entry appears atomically, so a
    /// concurrent `load` sees either nothing or the whole value.
    pub fn store<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        let mut tmp = NamedTempFile::new_in(self.dir.path())?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(self.entry_path(key))?;
        Ok(())
    }

    /// `load`, or compute and `store` on a miss.
    pub fn get_or_insert_with<T, F>(&self, key: &CacheKey, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(hit) = self.load(key)? {
            return Ok(hit);
        }
        let value = compute()?;
        self.store(key, &value)?;
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Remove the scratch directory and everything in it.
    pub fn clear(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(path = %path.display(), "cleared scratch cache");
        Ok(())
    }
}
