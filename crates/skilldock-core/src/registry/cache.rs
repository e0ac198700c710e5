//! On-disk cache for the merged index, with a TTL freshness check.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::registry::types::Index;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedIndex {
    index: Index,
    fetched_at: DateTime<Utc>,
}

pub struct CacheManager {
    path: PathBuf,
    cached: Option<CachedIndex>,
}

impl CacheManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }

    /// Read the cache from disk. An absent or malformed file simply yields
    /// no cache; only real I/O faults are errors.
    pub fn load(&mut self) -> Result<()> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.cached = None;
                return Ok(());
            }
            Err(e) => return Err(Error::io("read", &self.path, e)),
        };
        self.cached = match serde_yaml::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("ignoring malformed index cache {}: {e}", self.path.display());
                None
            }
        };
        Ok(())
    }

    /// Whether a cached index exists and was fetched within the TTL.
    pub fn is_valid(&self, ttl_hours: u64) -> bool {
        self.cached
            .as_ref()
            .map(|c| is_fresh(c.fetched_at, ttl_hours, Utc::now()))
            .unwrap_or(false)
    }

    pub fn get(&self) -> Option<&Index> {
        self.cached.as_ref().map(|c| &c.index)
    }

    /// Replace the cached index, stamped now, and persist it.
    pub fn set(&mut self, index: Index) -> Result<()> {
        self.cached = Some(CachedIndex {
            index,
            fetched_at: Utc::now(),
        });
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(cached) = &self.cached else {
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create", parent, e))?;
        }
        let raw = serde_yaml::to_string(cached).map_err(|e| Error::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, raw).map_err(|e| Error::io("write", &self.path, e))
    }
}

fn is_fresh(fetched_at: DateTime<Utc>, ttl_hours: u64, now: DateTime<Utc>) -> bool {
    now - fetched_at < Duration::hours(ttl_hours as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::SkillEntry;

    fn sample_index() -> Index {
        Index {
            skills: vec![SkillEntry {
                name: "widget".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn freshness_boundary() {
        let now = Utc::now();
        let ttl = 24;
        let just_inside = now - Duration::hours(24) + Duration::seconds(5);
        let just_outside = now - Duration::hours(24) - Duration::seconds(5);
        assert!(is_fresh(just_inside, ttl, now));
        assert!(!is_fresh(just_outside, ttl, now));
    }

    #[test]
    fn absent_cache_loads_as_none() {
        let temp = tempfile::tempdir().unwrap();
        let mut cache = CacheManager::new(temp.path().join("cache.yaml"));
        cache.load().unwrap();
        assert!(cache.get().is_none());
        assert!(!cache.is_valid(24));
    }

    #[test]
    fn malformed_cache_is_treated_as_absent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cache.yaml");
        fs::write(&path, "{{{{not yaml").unwrap();

        let mut cache = CacheManager::new(&path);
        cache.load().unwrap();
        assert!(cache.get().is_none());
    }

    #[test]
    fn set_then_load_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cache.yaml");

        let mut cache = CacheManager::new(&path);
        cache.set(sample_index()).unwrap();
        assert!(cache.is_valid(24));

        let mut reloaded = CacheManager::new(&path);
        reloaded.load().unwrap();
        assert!(reloaded.is_valid(24));
        assert_eq!(reloaded.get().unwrap().skills[0].name, "widget");
        assert!(!reloaded.is_valid(0), "zero TTL is always stale");
    }
}
