use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::LessonKey;
use crate::progress::error::CacheResult;

/// Synchronous key-value store for completion sets, scoped to this machine.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;
    fn remove(&self, key: &str) -> CacheResult<()>;
}

pub fn cache_key(user_id: u64, course_id: u64) -> String {
    format!("course_progress_{user_id}_{course_id}")
}

/// Stored completion set. `version` grows with every write so concurrent writers
/// (two players on the same course) can detect each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub keys: BTreeSet<LessonKey>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Versioned(CacheEntry),
    Legacy(Vec<LessonKey>),
}

impl CacheEntry {
    pub fn new(version: u64, keys: BTreeSet<LessonKey>) -> Self {
        Self {
            version,
            updated_at: Utc::now(),
            keys,
        }
    }

    /// Accepts the versioned object and the older bare array of keys.
    /// Anything unreadable is treated as an empty cache.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str::<StoredEntry>(raw) {
            Ok(StoredEntry::Versioned(entry)) => Some(entry),
            Ok(StoredEntry::Legacy(keys)) => Some(Self {
                version: 0,
                updated_at: DateTime::<Utc>::default(),
                keys: keys.into_iter().collect(),
            }),
            Err(e) => {
                tracing::warn!("ignoring unreadable progress cache entry: {e}");
                None
            }
        }
    }

    pub fn encode(&self) -> CacheResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> CacheResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        // write-then-rename so a reader never sees a torn file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
