use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// On-disk cache of raw provider payloads, one JSON file per key.
///
/// Two collections: `matches/` holds records keyed by match id and kept
/// forever (match results never change), `rating_history/` holds records
/// keyed by player id and honored only within `volatile_ttl` of their last
/// write (ranking state moves, a stale read would be misleading).
///
/// Every miss, expiry, or unreadable file reads as `None`: absence is a
/// normal outcome here and the caller simply refetches.
#[derive(Debug)]
pub struct RecordCache {
    base_dir: PathBuf,
    volatile_ttl: Duration,
}

impl RecordCache {
    pub fn new(base_dir: impl Into<PathBuf>, volatile_ttl: Duration) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join("matches"))?;
        std::fs::create_dir_all(base_dir.join("rating_history"))?;
        Ok(Self { base_dir, volatile_ttl })
    }

    pub fn match_record(&self, match_id: &str) -> Option<serde_json::Value> {
        self.read_json(&self.entry_path("matches", match_id), None)
    }

    pub fn store_match_record(&self, match_id: &str, payload: &serde_json::Value) {
        self.write_json(&self.entry_path("matches", match_id), payload);
    }

    pub fn rating_history(&self, subject_id: &str) -> Option<serde_json::Value> {
        self.read_json(
            &self.entry_path("rating_history", subject_id),
            Some(self.volatile_ttl),
        )
    }

    pub fn store_rating_history(&self, subject_id: &str, payload: &serde_json::Value) {
        self.write_json(&self.entry_path("rating_history", subject_id), payload);
    }

    fn entry_path(&self, collection: &str, key: &str) -> PathBuf {
        self.base_dir.join(collection).join(format!("{key}.json"))
    }

    /// TTL is measured from the file's last write, not last read.
    fn read_json(&self, path: &Path, ttl: Option<Duration>) -> Option<serde_json::Value> {
        let meta = std::fs::metadata(path).ok()?;

        if let Some(ttl) = ttl {
            let modified = meta.modified().ok()?;
            let age = modified.elapsed().ok()?;
            if age > ttl {
                return None;
            }
        }

        let raw = std::fs::read(path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("discarding corrupt cache entry {}: {e}", path.display());
                None
            }
        }
    }

    fn write_json(&self, path: &Path, payload: &serde_json::Value) {
        let body = match serde_json::to_vec_pretty(payload) {
            Ok(b) => b,
            Err(e) => {
                warn!("failed to serialize cache entry {}: {e}", path.display());
                return;
            }
        };
        if let Err(e) = std::fs::write(path, body) {
            warn!("failed to write cache entry {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(30 * 60);

    fn temp_cache(ttl: Duration) -> (tempfile::TempDir, RecordCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = RecordCache::new(dir.path(), ttl).unwrap();
        (dir, cache)
    }

    #[test]
    fn match_round_trip_returns_identical_payload() {
        let (_dir, cache) = temp_cache(TTL);
        let payload = json!({"metadata": {"matchid": "abc"}, "rounds": [1, 2, 3]});

        assert!(cache.match_record("abc").is_none());
        cache.store_match_record("abc", &payload);
        assert_eq!(cache.match_record("abc"), Some(payload));
    }

    #[test]
    fn put_overwrites_prior_value() {
        let (_dir, cache) = temp_cache(TTL);
        cache.store_match_record("abc", &json!({"v": 1}));
        cache.store_match_record("abc", &json!({"v": 2}));
        assert_eq!(cache.match_record("abc"), Some(json!({"v": 2})));
    }

    #[test]
    fn volatile_entry_expires_after_ttl() {
        let (_dir, cache) = temp_cache(Duration::from_millis(5));
        cache.store_rating_history("puuid-1", &json!([{"elo": 100}]));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.rating_history("puuid-1").is_none());
    }

    #[test]
    fn durable_entry_survives_where_volatile_would_expire() {
        let (_dir, cache) = temp_cache(Duration::from_millis(5));
        cache.store_match_record("abc", &json!({"v": 1}));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.match_record("abc").is_some());
    }

    #[test]
    fn corrupt_entry_reads_as_absent() {
        let (dir, cache) = temp_cache(TTL);
        std::fs::write(dir.path().join("matches/bad.json"), b"{not json").unwrap();
        assert!(cache.match_record("bad").is_none());
    }
}
