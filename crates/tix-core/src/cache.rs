use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    at: DateTime<Utc>,
    value: String,
}

/// Time-boxed cache shielding build/review providers from being re-queried
/// more than once per TTL window per key. Loaded lazily on first use and
/// flushed to disk after every write so sibling invocations see updates.
/// In offline mode every lookup reports "no data" without invoking the
/// compute closure.
pub struct StatusCache {
    path: PathBuf,
    ttl_min: i64,
    offline: bool,
    loaded: bool,
    entries: HashMap<String, CacheEntry>,
}

impl StatusCache {
    pub fn new(path: PathBuf, ttl_min: i64, offline: bool) -> Self {
        Self {
            path,
            ttl_min,
            offline,
            loaded: false,
            entries: HashMap::new(),
        }
    }

    /// Return the cached value for `key`, invoking `fetch` only when the
    /// entry is missing or older than the TTL. `Ok(None)` means offline.
    pub fn get_with<F>(&mut self, key: &str, fetch: F) -> Result<Option<String>>
    where
        F: FnOnce() -> Result<String>,
    {
        if self.offline {
            debug!(key, "offline: skipping external query");
            return Ok(None);
        }
        self.ensure_loaded()?;

        let now = Utc::now();
        if let Some(entry) = self.entries.get(key) {
            if (now - entry.at).num_minutes() < self.ttl_min {
                debug!(key, "cache hit");
                return Ok(Some(entry.value.clone()));
            }
        }

        debug!(key, "cache miss, querying provider");
        let value = fetch()?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                at: now,
                value: value.clone(),
            },
        );
        self.flush()?;
        Ok(Some(value))
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        if self.path.exists() {
            let data = std::fs::read_to_string(&self.path)?;
            self.entries = serde_yaml::from_str(&data)?;
        }
        self.loaded = true;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let data = serde_yaml::to_string(&self.entries)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_lookup_hits_cache() {
        let dir = TempDir::new().unwrap();
        let mut cache = StatusCache::new(dir.path().join("cache.yaml"), 5, false);
        let mut calls = 0;
        for _ in 0..2 {
            let v = cache
                .get_with("build:42", || {
                    calls += 1;
                    Ok("Pending".to_string())
                })
                .unwrap();
            assert_eq!(v.as_deref(), Some("Pending"));
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_ttl_always_refetches() {
        let dir = TempDir::new().unwrap();
        let mut cache = StatusCache::new(dir.path().join("cache.yaml"), 0, false);
        let mut calls = 0;
        for _ in 0..2 {
            cache
                .get_with("build:42", || {
                    calls += 1;
                    Ok("Success".to_string())
                })
                .unwrap();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn offline_mode_returns_no_data() {
        let dir = TempDir::new().unwrap();
        let mut cache = StatusCache::new(dir.path().join("cache.yaml"), 5, true);
        let v = cache
            .get_with("build:42", || {
                panic!("must not query providers while offline")
            })
            .unwrap();
        assert!(v.is_none());
    }

    #[test]
    fn writes_are_visible_to_sibling_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.yaml");
        let mut first = StatusCache::new(path.clone(), 5, false);
        first.get_with("review:r-9", || Ok("Fail".to_string())).unwrap();

        let mut second = StatusCache::new(path, 5, false);
        let v = second
            .get_with("review:r-9", || panic!("should be served from disk"))
            .unwrap();
        assert_eq!(v.as_deref(), Some("Fail"));
    }
}
