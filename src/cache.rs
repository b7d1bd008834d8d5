//! Background illustration cache.
//!
//! Generating an illustration is the slow, paid step of the pipeline; a
//! single call can take tens of seconds. This module lets a run skip the call
//! when the same content has been illustrated before.
//!
//! # Design
//!
//! Only the background illustration is cached. Composition (overlay, title,
//! badge) always runs, so changing the branding or layout config is picked up
//! without a cache bust.
//!
//! ## Cache keys
//!
//! The cache is **content-addressed** by `(title, series, identifier)`:
//! SHA-256 over the three fields, NUL-separated behind a domain prefix. The key
//! never depends on time, randomness, or the selected style, so identical
//! content always maps to the same file.
//!
//! A cache hit requires:
//! 1. A manifest entry for the key exists
//! 2. The referenced file still exists on disk
//!
//! A dangling entry (file deleted) is a miss, not an error; the next store
//! overwrites it.
//!
//! ## Storage
//!
//! ```text
//! {output-root}/.cache/
//! ├── manifest.json        # flat JSON object: key → filename
//! └── bg-{key}.png
//! ```
//!
//! The manifest is read once when the [`CacheManager`] opens and written once
//! by [`CacheManager::flush`]. Two runs against the same directory at the same
//! time are last-writer-wins on the manifest.
//!
//! ## Bypassing the cache
//!
//! `force` makes every lookup miss for the run. Stores still happen, so the
//! run refreshes every entry it touches.

use crate::imaging::{self, ImagingError};
use image::RgbImage;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the cache directory within the output root.
pub const CACHE_DIRNAME: &str = ".cache";

/// Name of the manifest file within the cache directory.
const MANIFEST_FILENAME: &str = "manifest.json";

/// Extension of cached backgrounds. Lossless so re-runs composite identical pixels.
const BACKGROUND_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cache write failed: {0}")]
    Imaging(#[from] ImagingError),
}

/// Stable cache key for a content item.
pub fn compute_key(title: &str, series: &str, identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"sharecard-background\0");
    hasher.update(title.as_bytes());
    hasher.update(b"\0");
    hasher.update(series.as_bytes());
    hasher.update(b"\0");
    hasher.update(identifier.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Filename a key is stored under.
pub fn background_filename(key: &str) -> String {
    format!("bg-{key}.{BACKGROUND_EXTENSION}")
}

/// In-memory view of the cache manifest for one run.
#[derive(Debug)]
pub struct CacheManager {
    dir: PathBuf,
    entries: BTreeMap<String, String>,
    force: bool,
    dirty: bool,
    stats: CacheStats,
}

impl CacheManager {
    /// Open the cache in `dir`, loading the manifest once.
    ///
    /// A missing manifest is an empty cache. An unreadable or unparseable
    /// manifest is also an empty cache, logged as a warning.
    pub fn open(dir: impl Into<PathBuf>, force: bool) -> Self {
        let dir = dir.into();
        let entries = load_manifest(&dir);
        debug!(dir = %dir.display(), entries = entries.len(), force, "opened background cache");
        Self {
            dir,
            entries,
            force,
            dirty: false,
            stats: CacheStats::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILENAME)
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a cached background.
    ///
    /// Returns `Some(path)` only if an entry exists **and** the file is on
    /// disk. Always `None` when the cache is forced.
    pub fn lookup(&mut self, key: &str) -> Option<PathBuf> {
        if self.force {
            self.stats.miss();
            return None;
        }
        let Some(filename) = self.entries.get(key) else {
            self.stats.miss();
            return None;
        };
        let path = self.dir.join(filename);
        if path.is_file() {
            self.stats.hit();
            Some(path)
        } else {
            warn!(key, file = %path.display(), "cache entry points at a missing file, treating as miss");
            self.stats.stale();
            None
        }
    }

    /// Record that a looked-up entry could not be used (e.g. undecodable file).
    ///
    /// Converts the hit already counted into a stale miss.
    pub fn invalidate(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.dirty = true;
        }
        self.stats.hits = self.stats.hits.saturating_sub(1);
        self.stats.stale();
    }

    /// Write a background to `bg-{key}.png` and record it in the manifest.
    ///
    /// Creates the cache directory on first use. The manifest itself is not
    /// written until [`flush`](Self::flush).
    pub fn store(&mut self, key: &str, image: &RgbImage) -> Result<PathBuf, CacheError> {
        let filename = background_filename(key);
        let path = self.dir.join(&filename);
        let bytes = imaging::encode_png(image)?;
        imaging::write_atomic(&path, &bytes)?;
        self.entries.insert(key.to_string(), filename);
        self.dirty = true;
        Ok(path)
    }

    /// Write the manifest if anything changed since it was opened.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        imaging::write_atomic(&self.manifest_path(), json.as_bytes())?;
        self.dirty = false;
        Ok(())
    }
}

fn load_manifest(dir: &Path) -> BTreeMap<String, String> {
    let path = dir.join(MANIFEST_FILENAME);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "cache manifest unreadable, starting empty");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "cache manifest corrupt, starting empty");
            BTreeMap::new()
        }
    }
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    /// Entries whose file was missing or unreadable.
    pub stale: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn stale(&mut self) {
        self.stale += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.stale
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let misses = self.misses + self.stale;
        if self.hits > 0 {
            write!(f, "{} cached, {} missed", self.hits, misses)?;
        } else {
            write!(f, "{} missed", misses)?;
        }
        if self.stale > 0 {
            write!(f, " ({} stale)", self.stale)?;
        }
        Ok(())
    }
}
