//! Disk-backed response cache with age-based expiry.
//!
//! One JSON file per entry under the cache directory, named by the cache
//! key: the SHA-256 hex digest of `question|context|model`. Entries older
//! than the configured max age, and entries that no longer parse, are
//! deleted the next time they are read.
//!
//! Caching is best-effort: nothing here ever returns an error to the caller.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Default entry lifetime: 24 hours
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

const ENTRY_EXTENSION: &str = "json";

/// A persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub question: String,
    pub response: String,
    pub context: String,
    pub model: String,
    /// ISO-8601 write time.
    pub timestamp: String,
    pub cache_key: String,
}

impl CacheEntry {
    /// Parse the stored timestamp.
    ///
    /// Accepts RFC 3339 and offset-less ISO-8601 (read as local time).
    pub fn created_at(&self) -> Option<DateTime<Local>> {
        parse_timestamp(&self.timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entry files.
    pub total_files: usize,
    /// Combined size in MB, rounded to 2 decimals.
    pub total_size_mb: f64,
    /// Oldest modification time, `None` when empty.
    pub oldest_file: Option<DateTime<Local>>,
    /// Newest modification time, `None` when empty.
    pub newest_file: Option<DateTime<Local>>,
    pub cache_dir: PathBuf,
    pub max_age_hours: f64,
}

/// Content-addressed response cache.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
    max_age: Duration,
}

impl ResponseCache {
    /// Create a cache rooted at `cache_dir`, creating the directory if needed.
    pub fn new(cache_dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        let cache = Self {
            cache_dir: cache_dir.into(),
            max_age,
        };
        cache.ensure_dir();
        cache
    }

    /// Build the cache key for a `(question, context, model)` triple.
    ///
    /// Byte-exact and case-sensitive; empty strings still take part.
    pub fn cache_key(question: &str, context: &str, model: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(question.as_bytes());
        hasher.update(b"|");
        hasher.update(context.as_bytes());
        hasher.update(b"|");
        hasher.update(model.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a cached response.
    ///
    /// Expired and unreadable entries are removed and reported as a miss.
    pub fn get(&self, question: &str, context: &str, model: &str) -> Option<String> {
        let key = Self::cache_key(question, context, model);
        let path = self.entry_path(&key);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!(key = %&key[..8], "Unreadable cache entry: {}", e);
                self.discard(&path);
                return None;
            }
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %&key[..8], "Corrupt cache entry, removing: {}", e);
                self.discard(&path);
                return None;
            }
        };

        let Some(created_at) = entry.created_at() else {
            debug!(key = %&key[..8], "Cache entry has an invalid timestamp, removing");
            self.discard(&path);
            return None;
        };

        if self.is_expired(created_at) {
            debug!(key = %&key[..8], "Cache entry expired, removing");
            self.discard(&path);
            return None;
        }

        Some(entry.response)
    }

    /// Store a response, overwriting any entry with the same key.
    ///
    /// Storage failures are logged and swallowed.
    pub fn set(&self, question: &str, response: &str, context: &str, model: &str) {
        let key = Self::cache_key(question, context, model);
        let entry = CacheEntry {
            question: question.to_string(),
            response: response.to_string(),
            context: context.to_string(),
            model: model.to_string(),
            timestamp: Local::now().to_rfc3339(),
            cache_key: key.clone(),
        };

        self.ensure_dir();
        let result = serde_json::to_string_pretty(&entry)
            .map_err(io::Error::from)
            .and_then(|data| fs::write(self.entry_path(&key), data));

        if let Err(e) = result {
            warn!("⚠️ Could not cache response: {}", e);
        }
    }

    /// Delete entries whose modification time is older than `max_age`.
    ///
    /// Falls back to the configured max age. Entries that cannot be
    /// inspected or removed are skipped. Returns the number removed.
    pub fn clear(&self, max_age: Option<Duration>) -> usize {
        let threshold = max_age.unwrap_or(self.max_age);
        let now = SystemTime::now();

        let cleared = self
            .entry_files()
            .into_iter()
            .filter(|path| {
                let age = fs::metadata(path)
                    .and_then(|meta| meta.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok());
                matches!(age, Some(age) if age > threshold)
            })
            .filter(|path| fs::remove_file(path).is_ok())
            .count();

        debug!("Cleared {} cache entries older than {:?}", cleared, threshold);
        cleared
    }

    /// Return aggregate statistics about the cache.
    pub fn stats(&self) -> CacheStats {
        let mut total_files = 0;
        let mut total_size: u64 = 0;
        let mut oldest: Option<SystemTime> = None;
        let mut newest: Option<SystemTime> = None;

        for path in self.entry_files() {
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            let Ok(modified) = meta.modified() else {
                continue;
            };

            total_files += 1;
            total_size += meta.len();
            oldest = Some(oldest.map_or(modified, |t| t.min(modified)));
            newest = Some(newest.map_or(modified, |t| t.max(modified)));
        }

        CacheStats {
            total_files,
            total_size_mb: round_mb(total_size),
            oldest_file: oldest.map(DateTime::<Local>::from),
            newest_file: newest.map(DateTime::<Local>::from),
            cache_dir: self.cache_dir.clone(),
            max_age_hours: self.max_age.as_secs_f64() / 3600.0,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, ENTRY_EXTENSION))
    }

    // -- private helpers ---------------------------------------------------

    fn is_expired(&self, created_at: DateTime<Local>) -> bool {
        // Negative ages (clock moved backwards) count as fresh
        match Local::now().signed_duration_since(created_at).to_std() {
            Ok(age) => age > self.max_age,
            Err(_) => false,
        }
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("Could not remove cache entry {:?}: {}", path, e);
            }
        }
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(dir) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        dir.filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == ENTRY_EXTENSION))
            .collect()
    }

    fn ensure_dir(&self) {
        if let Err(e) = fs::create_dir_all(&self.cache_dir) {
            warn!("Could not create cache directory {:?}: {}", self.cache_dir, e);
        }
    }
}

fn round_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
