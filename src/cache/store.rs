//! On-disk response cache
//!
//! One JSON file maps cache keys to `{ "data": <payload>, "time": <unix secs> }`.
//! The whole file is the unit of locking: readers take a shared lock,
//! writers take an exclusive lock and re-read the file inside it before
//! writing, so concurrent writers in other processes are never clobbered.

use crate::cache::key::CacheKey;
use crate::error::{VientoError, VientoResult};
use crate::lock::{LockGuard, LockMode, Locker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cache file name, relative to the working directory
pub const CACHE_FILE_NAME: &str = "response_cache.json";

/// Default maximum entry age
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Current time as fractional unix seconds
pub fn unix_now() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// One cached upstream response
///
/// Never modified after creation; refreshing a key replaces the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Upstream payload, stored as received
    pub data: Value,
    /// Creation time, unix seconds
    pub time: f64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(data: Value) -> Self {
        Self {
            data,
            time: unix_now(),
        }
    }

    /// Creation time as a UTC timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.time.floor();
        let nanos = ((self.time - secs) * 1_000_000_000.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }

    /// Age in seconds at `now`
    pub fn age(&self, now: f64) -> f64 {
        now - self.time
    }

    /// Whether the entry is older than `ttl` at `now`
    pub fn is_expired_at(&self, now: f64, ttl: Duration) -> bool {
        self.age(now) > ttl.as_secs_f64()
    }
}

/// Full contents of the cache file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheFile {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheFile {
    /// Parse file contents; a blank file is an empty mapping
    fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    /// Drop entries older than `ttl`, returning how many were removed
    pub fn retain_fresh(&mut self, now: f64, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now, ttl));
        before - self.entries.len()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}

/// Cross-process cache backed by a single locked JSON file
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    ttl: Duration,
    locker: Locker,
}

impl CacheStore {
    /// Create a store for `path` with the default TTL
    ///
    /// The file is created lazily by the first write.
    pub fn new(path: impl Into<PathBuf>, locker: Locker) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
            locker,
        }
    }

    /// Replace the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh entry
    ///
    /// Returns `Ok(None)` when the file or key is absent, the entry is older
    /// than the TTL, or the file cannot be parsed. Expired entries stay in
    /// the file.
    pub fn get(&self, key: &CacheKey) -> VientoResult<Option<CacheEntry>> {
        let Some(file) = self.open_for_read()? else {
            debug!("Cache miss for {}: no cache file", key);
            return Ok(None);
        };
        let guard = self.locker.acquire(file, LockMode::Shared, true)?;
        let mapping = self.read_mapping(&guard)?;
        guard.release()?;

        // Expiry is judged after the lock is gone
        Ok(self.lookup(&mapping, key))
    }

    /// Async variant of [`get`](Self::get)
    pub async fn get_async(&self, key: &CacheKey) -> VientoResult<Option<CacheEntry>> {
        let Some(file) = self.open_for_read()? else {
            debug!("Cache miss for {}: no cache file", key);
            return Ok(None);
        };
        let guard = self.locker.acquire_async(file, LockMode::Shared, true).await?;
        let mapping = self.read_mapping(&guard)?;
        guard.release()?;
        Ok(self.lookup(&mapping, key))
    }

    /// Store `payload` under `key` with a fresh timestamp
    ///
    /// The read-modify-write runs under one exclusive lock.
    pub fn put(&self, key: &CacheKey, payload: Value) -> VientoResult<CacheEntry> {
        let entry = CacheEntry::new(payload);
        let stored = entry.clone();
        self.update(move |mapping| {
            mapping.insert(key.to_string(), stored);
        })?;
        debug!("Cached {} at {}", key, entry.time);
        Ok(entry)
    }

    /// Async variant of [`put`](Self::put)
    pub async fn put_async(&self, key: &CacheKey, payload: Value) -> VientoResult<CacheEntry> {
        let entry = CacheEntry::new(payload);
        let guard = self.lock_for_write_async().await?;

        // Re-read inside the exclusive lock so other writers are kept
        let original = self.read_raw(&guard)?;
        let mut mapping = self.decode(&original);
        mapping.insert(key.to_string(), entry.clone());

        self.write_mapping(&guard, &mapping, &original)?;
        guard.release()?;
        debug!("Cached {} at {}", key, entry.time);
        Ok(entry)
    }

    /// Remove entries older than the TTL, returning how many were removed
    pub fn purge_expired(&self) -> VientoResult<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let ttl = self.ttl;
        let removed = self.update(|mapping| mapping.retain_fresh(unix_now(), ttl))?;
        info!("Purged {} expired cache entries", removed);
        Ok(removed)
    }

    /// Remove every entry, returning how many were removed
    pub fn clear(&self) -> VientoResult<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let removed = self.update(CacheFile::clear)?;
        info!("Cleared {} cache entries", removed);
        Ok(removed)
    }

    /// Snapshot of the whole file, expired entries included
    pub fn snapshot(&self) -> VientoResult<CacheFile> {
        let Some(file) = self.open_for_read()? else {
            return Ok(CacheFile::default());
        };
        let guard = self.locker.acquire(file, LockMode::Shared, true)?;
        let mapping = self.read_mapping(&guard)?;
        guard.release()?;
        Ok(mapping)
    }

    /// Exclusive read-modify-write of the whole mapping
    fn update<R>(&self, apply: impl FnOnce(&mut CacheFile) -> R) -> VientoResult<R> {
        let file = self.open_for_write()?;
        let guard = self.locker.acquire(file, LockMode::Exclusive, true)?;

        // Re-read inside the exclusive lock so other writers are kept
        let original = self.read_raw(&guard)?;
        let mut mapping = self.decode(&original);
        let result = apply(&mut mapping);

        self.write_mapping(&guard, &mapping, &original)?;
        guard.release()?;
        Ok(result)
    }

    async fn lock_for_write_async(&self) -> VientoResult<LockGuard> {
        let file = self.open_for_write()?;
        self.locker
            .acquire_async(file, LockMode::Exclusive, true)
            .await
    }

    fn lookup(&self, mapping: &CacheFile, key: &CacheKey) -> Option<CacheEntry> {
        let name = key.to_string();
        let entry = match mapping.get(&name) {
            Some(entry) => entry,
            None => {
                debug!("Cache miss for {}", name);
                return None;
            }
        };

        if entry.is_expired_at(unix_now(), self.ttl) {
            debug!("Cache entry for {} is expired", name);
            return None;
        }

        debug!("Cache hit for {}", name);
        Some(entry.clone())
    }

    fn open_for_read(&self) -> VientoResult<Option<File>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VientoError::io(
                format!("opening cache file {}", self.path.display()),
                e,
            )),
        }
    }

    fn open_for_write(&self) -> VientoResult<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    VientoError::io(format!("creating cache directory {}", parent.display()), e)
                })?;
            }
        }

        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                VientoError::io(format!("opening cache file {}", self.path.display()), e)
            })
    }

    /// Read the mapping through a held lock; corrupt content reads as empty
    fn read_mapping(&self, guard: &LockGuard) -> VientoResult<CacheFile> {
        let bytes = self.read_raw(guard)?;
        Ok(self.decode(&bytes))
    }

    fn read_raw(&self, guard: &LockGuard) -> VientoResult<Vec<u8>> {
        let mut file = guard.file();
        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_end(&mut bytes))
            .map_err(|e| {
                VientoError::io(format!("reading cache file {}", self.path.display()), e)
            })?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> CacheFile {
        match CacheFile::parse(bytes) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(
                    "Cache file {} is corrupt, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                CacheFile::default()
            }
        }
    }

    /// Replace the file contents through a held exclusive lock
    ///
    /// `original` is what the file held when the lock was taken; it is put
    /// back if the new contents cannot be written in full.
    fn write_mapping(
        &self,
        guard: &LockGuard,
        mapping: &CacheFile,
        original: &[u8],
    ) -> VientoResult<()> {
        let bytes = serde_json::to_vec_pretty(mapping)
            .map_err(|e| VientoError::corrupt(&self.path, e.to_string()))?;

        let mut file = guard.file();
        rewrite(&mut file, &bytes, original).map_err(|e| {
            VientoError::io(format!("writing cache file {}", self.path.display()), e)
        })
    }
}

/// Seekable writer whose length can be set after writing
trait Resizable: Write + Seek {
    fn resize(&mut self, len: u64) -> io::Result<()>;
}

impl Resizable for &File {
    fn resize(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Overwrite `target` with `contents` from offset 0, then cut it to length
///
/// The file is never truncated up front. If writing fails, `original` is
/// written back so a full disk or a size limit cannot wipe the cache.
fn rewrite<W: Resizable>(target: &mut W, contents: &[u8], original: &[u8]) -> io::Result<()> {
    let Err(e) = replace_contents(target, contents) else {
        return Ok(());
    };

    if let Err(restore) = replace_contents(target, original) {
        warn!("Failed to restore cache file after a failed write: {}", restore);
    }
    Err(e)
}

fn replace_contents<W: Resizable>(target: &mut W, contents: &[u8]) -> io::Result<()> {
    target.seek(SeekFrom::Start(0))?;
    target.write_all(contents)?;
    target.resize(contents.len() as u64)?;
    target.flush()
}
