// src/news/cache.rs
//! Result cache: one `CacheEntry` per (query, limit).
//!
//! `MemoryCache` backs tests and ephemeral runs; `FileCache` persists one JSON
//! file per key and survives restarts.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::news::types::CacheEntry;

/// Deterministic key for a (query, limit) pair.
pub fn cache_key(query: &str, limit: usize) -> String {
    format!("news_cache_{query}_{limit}")
}

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn put(&self, key: &str, entry: &CacheEntry) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
    /// Most recently written entry with articles, under any key, expired or not.
    fn newest_across_keys(&self) -> Option<CacheEntry>;
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.lock().expect("cache mutex poisoned").get(key).cloned()
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> io::Result<()> {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.inner.lock().expect("cache mutex poisoned").remove(key);
        Ok(())
    }

    fn newest_across_keys(&self) -> Option<CacheEntry> {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .values()
            .filter(|e| !e.articles.is_empty())
            .max_by_key(|e| e.timestamp)
            .cloned()
    }
}

/// JSON files under a directory, written via temp file + rename.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let name: String = digest.iter().take(16).map(|b| format!("{b:02x}")).collect();
        self.dir.join(format!("{name}.json"))
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let s = fs::read_to_string(path).ok()?;
    serde_json::from_str(&s).ok()
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        read_entry(&self.path_for(key))
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn newest_across_keys(&self) -> Option<CacheEntry> {
        fs::read_dir(&self.dir)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .filter_map(|p| read_entry(&p))
            .filter(|e| !e.articles.is_empty())
            .max_by_key(|e| e.timestamp)
    }
}
