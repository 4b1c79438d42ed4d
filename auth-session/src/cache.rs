//! Best-effort local mirror of the authenticated identity.
//!
//! The cache only saves a round trip on startup. It is never a validity
//! source: a hydrated identity stays unverified until the authentication
//! service confirms it.

use crate::clock::elapsed;
use crate::error::CacheError;
use auth_identity::Identity;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The single stored entry: `{identity, timestamp, lastActivityAt}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub identity: Identity,
    /// When the session behind this entry was established or last verified
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        elapsed(now, self.timestamp) > max_age
    }
}

/// Storage for the one session cache entry
pub trait SessionCache: Send + Sync {
    /// `Ok(None)` when nothing is stored; `Err` when the stored entry cannot
    /// be read back.
    fn load(&self) -> Result<Option<CacheEntry>, CacheError>;

    fn store(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    fn clear(&self) -> Result<(), CacheError>;
}

/// In-process cache holding the serialized entry
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    raw: Mutex<Option<String>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with arbitrary stored text, as a browser store might hold
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Mutex::new(Some(raw.into())) }
    }

    pub fn with_entry(entry: &CacheEntry) -> Result<Self, CacheError> {
        Ok(Self::with_raw(serde_json::to_string(entry)?))
    }

    pub fn is_empty(&self) -> bool {
        self.raw.lock().is_none()
    }
}

impl SessionCache for MemorySessionCache {
    fn load(&self) -> Result<Option<CacheEntry>, CacheError> {
        self.raw
            .lock()
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(CacheError::from)
    }

    fn store(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let raw = serde_json::to_string(entry)?;
        *self.raw.lock() = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.raw.lock() = None;
        Ok(())
    }
}

/// JSON file named after the storage key, replaced atomically on write
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(directory: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: directory.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SessionCache for FileSessionCache {
    fn load(&self) -> Result<Option<CacheEntry>, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_vec(entry)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&raw)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
