//! Persistent, best-effort usage cache shared by every session.
//!
//! The store is one small JSON document keyed by session id. Every
//! operation reloads it from disk and every mutation rewrites it whole,
//! so consecutive render cycles see each other's writes. Overlapping
//! processes may lose an update; the transcript stays the durable source,
//! so that only costs a future cache hit.
//!
//! No operation here fails: I/O and parse problems are logged at debug
//! level and the store behaves as if it were empty.

use crate::clock::{Clock, SystemClock};
use crate::constants::{CACHE_STORE_VERSION, DEFAULT_CACHE_TTL};
use crate::error::{Result, StatusError};
use crate::types::{SessionId, UsageRecord};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A usage record and when it was written (epoch milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: i64,
    pub usage: UsageRecord,
}

impl CacheEntry {
    /// Stored timestamps come from disk and may be arbitrary, so the age saturates
    #[inline]
    fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) > ttl_ms
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheStore {
    version: u32,
    #[serde(default)]
    sessions: HashMap<SessionId, CacheEntry>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self {
            version: CACHE_STORE_VERSION,
            sessions: HashMap::new(),
        }
    }
}

fn load_store(path: &Path) -> Result<CacheStore> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CacheStore::default()),
        Err(source) => {
            return Err(StatusError::FileRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let store: CacheStore =
        serde_json::from_str(&contents).map_err(|source| StatusError::JsonParse {
            context: path.display().to_string(),
            source,
        })?;

    if store.version != CACHE_STORE_VERSION {
        return Err(StatusError::StoreVersion {
            found: store.version,
        });
    }

    Ok(store)
}

fn save_store(path: &Path, store: &CacheStore) -> Result<()> {
    let json = serde_json::to_vec_pretty(store).map_err(|source| StatusError::JsonParse {
        context: "usage cache store".to_string(),
        source,
    })?;

    fs::write(path, json).map_err(|source| StatusError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Session id → usage record store with a fixed time-to-live
#[derive(Debug)]
pub struct CacheManager<C: Clock = SystemClock> {
    path: PathBuf,
    ttl: Duration,
    store: CacheStore,
    clock: C,
}

impl CacheManager {
    /// Open the store at `path` with the default five minute TTL
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::with_clock(path, ttl, SystemClock)
    }
}

impl<C: Clock> CacheManager<C> {
    /// Open the store, creating its directory up front
    pub fn with_clock(path: impl Into<PathBuf>, ttl: Duration, clock: C) -> Self {
        let path = path.into();
        if let Some(dir) = path.parent()
            && let Err(source) = fs::create_dir_all(dir)
        {
            let err = StatusError::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            };
            tracing::debug!("usage cache unavailable: {}", err);
        }

        let mut manager = Self {
            path,
            ttl,
            store: CacheStore::default(),
            clock,
        };
        manager.reload();
        manager
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached usage for a session. An entry older than the TTL is removed
    /// from the store on this read and reported as absent.
    pub fn get(&mut self, session_id: &SessionId) -> Option<UsageRecord> {
        self.reload();

        let entry = *self.store.sessions.get(session_id)?;
        if entry.is_expired(self.now_millis(), self.ttl.num_milliseconds()) {
            tracing::debug!("usage cache entry for {} expired", session_id);
            self.store.sessions.remove(session_id);
            self.persist();
            return None;
        }

        Some(entry.usage)
    }

    pub fn set(&mut self, session_id: &SessionId, usage: UsageRecord) {
        self.reload();
        let entry = CacheEntry {
            timestamp: self.now_millis(),
            usage,
        };
        self.store.sessions.insert(session_id.clone(), entry);
        self.persist();
    }

    /// Drop every session from the store
    pub fn clear(&mut self) {
        self.store.sessions.clear();
        self.persist();
    }

    /// Remove all expired entries, returning how many were dropped
    pub fn evict_expired(&mut self) -> usize {
        self.reload();

        let now = self.now_millis();
        let ttl_ms = self.ttl.num_milliseconds();
        let before = self.store.sessions.len();
        self.store
            .sessions
            .retain(|_, entry| !entry.is_expired(now, ttl_ms));

        let removed = before - self.store.sessions.len();
        if removed > 0 {
            tracing::debug!("evicted {} expired usage cache entries", removed);
            self.persist();
        }
        removed
    }

    #[inline]
    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    fn reload(&mut self) {
        self.store = load_store(&self.path).unwrap_or_else(|e| {
            tracing::debug!("ignoring unreadable usage cache: {}", e);
            CacheStore::default()
        });
    }

    fn persist(&self) {
        if let Err(e) = save_store(&self.path, &self.store) {
            tracing::debug!("failed to persist usage cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    /// Mock clock whose time the test can move forward
    fn controlled_clock() -> (MockClock, Arc<Mutex<DateTime<Utc>>>) {
        let time = Arc::new(Mutex::new(start_time()));
        let handle = Arc::clone(&time);
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(move || *handle.lock().unwrap());
        (clock, time)
    }

    fn manager_in(dir: &TempDir) -> (CacheManager<MockClock>, Arc<Mutex<DateTime<Utc>>>) {
        let (clock, time) = controlled_clock();
        let manager = CacheManager::with_clock(
            dir.path().join("usage-cache.json"),
            DEFAULT_CACHE_TTL,
            clock,
        );
        (manager, time)
    }

    fn advance(time: &Arc<Mutex<DateTime<Utc>>>, by: Duration) {
        let mut now = time.lock().unwrap();
        *now += by;
    }

    fn stored_sessions(path: &Path) -> serde_json::Value {
        let raw = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["sessions"].clone()
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _time) = manager_in(&dir);
        let session = SessionId::from("s1");
        let usage = UsageRecord::new(100, 20, 5, 300);

        cache.set(&session, usage);
        assert_eq!(cache.get(&session), Some(usage));
        assert_eq!(cache.get(&SessionId::from("other")), None);
    }

    #[test]
    fn test_store_shape() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _time) = manager_in(&dir);
        cache.set(&SessionId::from("s1"), UsageRecord::new(1, 2, 3, 4));

        let raw = fs::read_to_string(cache.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(
            value["sessions"]["s1"]["timestamp"],
            start_time().timestamp_millis()
        );
        assert_eq!(value["sessions"]["s1"]["usage"]["input_tokens"], 1);
        assert_eq!(value["sessions"]["s1"]["usage"]["cache_read_input_tokens"], 4);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let dir = TempDir::new().unwrap();
        let (mut cache, time) = manager_in(&dir);
        let session = SessionId::from("s1");
        cache.set(&session, UsageRecord::new(100, 20, 0, 0));

        advance(&time, DEFAULT_CACHE_TTL + Duration::milliseconds(1));
        assert_eq!(cache.get(&session), None);

        let sessions = stored_sessions(cache.path());
        assert!(sessions.get("s1").is_none());

        // A later process opening the same store sees nothing either
        let reopened = CacheManager::new(cache.path().to_path_buf());
        assert!(!reopened.store.sessions.contains_key(&session));
    }

    #[test]
    fn test_entry_at_exact_ttl_is_still_valid() {
        let dir = TempDir::new().unwrap();
        let (mut cache, time) = manager_in(&dir);
        let session = SessionId::from("s1");
        let usage = UsageRecord::new(7, 0, 0, 0);
        cache.set(&session, usage);

        advance(&time, DEFAULT_CACHE_TTL);
        assert_eq!(cache.get(&session), Some(usage));
    }

    #[test]
    fn test_sessions_are_independent() {
        let dir = TempDir::new().unwrap();
        let (mut cache, time) = manager_in(&dir);
        let old = SessionId::from("old");
        let fresh = SessionId::from("fresh");

        cache.set(&old, UsageRecord::new(1, 1, 0, 0));
        advance(&time, Duration::minutes(4));
        cache.set(&fresh, UsageRecord::new(2, 2, 0, 0));
        advance(&time, Duration::minutes(2));

        assert_eq!(cache.get(&old), None);
        assert_eq!(cache.get(&fresh), Some(UsageRecord::new(2, 2, 0, 0)));
    }

    #[test]
    fn test_evict_expired() {
        let dir = TempDir::new().unwrap();
        let (mut cache, time) = manager_in(&dir);

        cache.set(&SessionId::from("a"), UsageRecord::new(1, 0, 0, 0));
        cache.set(&SessionId::from("b"), UsageRecord::new(2, 0, 0, 0));
        advance(&time, Duration::minutes(3));
        cache.set(&SessionId::from("c"), UsageRecord::new(3, 0, 0, 0));
        advance(&time, Duration::minutes(3));

        assert_eq!(cache.evict_expired(), 2);
        assert_eq!(cache.evict_expired(), 0);

        let sessions = stored_sessions(cache.path());
        assert!(sessions.get("a").is_none());
        assert!(sessions.get("b").is_none());
        assert!(sessions.get("c").is_some());
    }

    #[test]
    fn test_extreme_stored_timestamp_expires() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage-cache.json");
        let store = serde_json::json!({
            "version": 1,
            "sessions": {
                "ancient": {"timestamp": i64::MIN, "usage": {"input_tokens": 1}},
                "recent": {"timestamp": start_time().timestamp_millis(),
                           "usage": {"input_tokens": 2}}
            }
        });
        fs::write(&path, store.to_string()).unwrap();

        let (clock, _time) = controlled_clock();
        let mut cache = CacheManager::with_clock(&path, DEFAULT_CACHE_TTL, clock);
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(
            cache.get(&SessionId::from("recent")),
            Some(UsageRecord::new(2, 0, 0, 0))
        );

        fs::write(&path, store.to_string()).unwrap();
        assert_eq!(cache.get(&SessionId::from("ancient")), None);
        assert!(stored_sessions(&path).get("ancient").is_none());
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _time) = manager_in(&dir);
        let session = SessionId::from("s1");
        cache.set(&session, UsageRecord::new(1, 1, 1, 1));

        cache.clear();
        assert_eq!(cache.get(&session), None);
        assert_eq!(stored_sessions(cache.path()), serde_json::json!({}));
    }

    #[test]
    fn test_writes_from_another_manager_are_visible() {
        let dir = TempDir::new().unwrap();
        let (mut first, _t1) = manager_in(&dir);
        let (mut second, _t2) = manager_in(&dir);

        first.set(&SessionId::from("a"), UsageRecord::new(1, 0, 0, 0));
        second.set(&SessionId::from("b"), UsageRecord::new(2, 0, 0, 0));

        assert_eq!(
            first.get(&SessionId::from("b")),
            Some(UsageRecord::new(2, 0, 0, 0))
        );
        assert_eq!(
            second.get(&SessionId::from("a")),
            Some(UsageRecord::new(1, 0, 0, 0))
        );
    }

    #[test]
    fn test_creates_directory_eagerly() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deeply").join("nested");
        let (clock, _time) = controlled_clock();
        let _cache = CacheManager::with_clock(
            nested.join("usage-cache.json"),
            DEFAULT_CACHE_TTL,
            clock,
        );
        assert!(nested.is_dir());
    }

    #[test]
    fn test_malformed_store_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage-cache.json");
        fs::write(&path, "{ not json").unwrap();

        let (clock, _time) = controlled_clock();
        let mut cache = CacheManager::with_clock(&path, DEFAULT_CACHE_TTL, clock);
        let session = SessionId::from("s1");
        assert_eq!(cache.get(&session), None);

        // The next write replaces the broken file with a valid store
        cache.set(&session, UsageRecord::new(5, 5, 0, 0));
        assert_eq!(cache.get(&session), Some(UsageRecord::new(5, 5, 0, 0)));
    }

    #[test]
    fn test_unknown_version_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage-cache.json");
        let future = serde_json::json!({
            "version": 2,
            "sessions": {"s1": {"timestamp": start_time().timestamp_millis(),
                                "usage": {"input_tokens": 9}}}
        });
        fs::write(&path, future.to_string()).unwrap();

        let (clock, _time) = controlled_clock();
        let mut cache = CacheManager::with_clock(&path, DEFAULT_CACHE_TTL, clock);
        assert_eq!(cache.get(&SessionId::from("s1")), None);
    }

    #[test]
    fn test_unwritable_location_is_silent() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let (clock, _time) = controlled_clock();
        let mut cache = CacheManager::with_clock(
            blocker.join("usage-cache.json"),
            DEFAULT_CACHE_TTL,
            clock,
        );
        let session = SessionId::from("s1");
        cache.set(&session, UsageRecord::new(1, 1, 0, 0));
        assert_eq!(cache.get(&session), None);
        assert_eq!(cache.evict_expired(), 0);
    }
}
